//! Cursor-based reader over an in-memory USTAR archive.
//!
//! [`ArchiveReader`] borrows the archive bytes and keeps nothing but a cursor
//! and the header decoded at it. Every call re-decodes the header under the
//! cursor, so no entry list is ever built.
//!
//! ## Example
//!
//! ```
//! use runtar::ArchiveReader;
//!
//! # fn walk(data: &[u8]) -> runtar::ustar::Result<()> {
//! let mut reader = ArchiveReader::new(data);
//! let header = *reader.current_entry()?;
//! println!("{} ({} bytes)", header.name, header.size);
//! let content = reader.entry_content_view()?;
//! assert_eq!(content.len() as u64, header.size);
//!
//! while let Ok(header) = reader.advance() {
//!     println!("{} ({} bytes)", header.name, header.size);
//! }
//! # Ok(())
//! # }
//! ```

use tracing::{debug, trace};

use super::error::{Result, TarError};
use super::structures::{BLOCK_SIZE, TarHeader, aligned_span};

/// Sequential reader over a complete archive held in memory.
///
/// The reader never copies or mutates the archive. Content returned by
/// [`entry_content_view`](Self::entry_content_view) borrows from the archive
/// buffer, not from the reader, so it stays usable after the reader moves on.
///
/// Cloning a reader gives an independent cursor over the same bytes.
#[derive(Debug, Clone)]
pub struct ArchiveReader<'a> {
    data: &'a [u8],
    /// Offset of the current header. `None` once the cursor has run off the
    /// end of the buffer.
    cursor: Option<usize>,
    /// Header decoded at `cursor` by the last successful decode.
    header: Option<TarHeader>,
}

impl<'a> ArchiveReader<'a> {
    /// Create a reader positioned at the first byte of `data`.
    ///
    /// Nothing is validated until the first call to
    /// [`current_entry`](Self::current_entry).
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            cursor: (!data.is_empty()).then_some(0),
            header: None,
        }
    }

    /// Create a reader from data that may be absent.
    ///
    /// # Errors
    ///
    /// Returns [`TarError::InvalidInput`] when `data` is `None`.
    pub fn create(data: Option<&'a [u8]>) -> Result<Self> {
        data.map(Self::new).ok_or(TarError::InvalidInput)
    }

    /// Iterate over all entries of `data`.
    pub fn entries(data: &'a [u8]) -> Entries<'a> {
        Entries {
            reader: Self::new(data),
            started: false,
            done: false,
        }
    }

    /// Length of the archive buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Offset of the header under the cursor, or `None` past the end.
    pub fn position(&self) -> Option<u64> {
        self.cursor.map(|c| c as u64)
    }

    /// Whether the cursor has run off the end of the archive.
    pub fn is_terminal(&self) -> bool {
        self.cursor.is_none()
    }

    /// The header from the last successful decode, if it is still current.
    pub fn header(&self) -> Option<&TarHeader> {
        self.header.as_ref()
    }

    /// Move the cursor back to the first byte.
    pub fn rewind(&mut self) {
        self.cursor = (!self.data.is_empty()).then_some(0);
        self.header = None;
    }

    /// Move the cursor to the header at `offset` and decode it.
    ///
    /// `offset` would normally come from [`position`](Self::position) or
    /// [`Entry::offset`].
    pub fn seek(&mut self, offset: u64) -> Result<&TarHeader> {
        self.header = None;
        self.cursor = usize::try_from(offset)
            .ok()
            .filter(|&offset| offset < self.data.len());
        self.decode_header_at()
    }

    /// Decode the header under the cursor.
    ///
    /// Must succeed before any decoded field is trusted.
    pub fn current_entry(&mut self) -> Result<&TarHeader> {
        self.decode_header_at()
    }

    /// The current entry's content, borrowed from the archive buffer.
    ///
    /// # Errors
    ///
    /// Fails when there is no valid header under the cursor, or with
    /// [`TarError::TruncatedContent`] when the archive ends before the
    /// declared content does.
    pub fn entry_content_view(&mut self) -> Result<&'a [u8]> {
        let (start, end) = self.content_range()?;
        Ok(&self.data[start..end])
    }

    /// An owned copy of the current entry's content.
    ///
    /// # Errors
    ///
    /// As [`entry_content_view`](Self::entry_content_view), plus
    /// [`TarError::Allocation`] when the copy cannot be allocated.
    pub fn entry_content_copy(&mut self) -> Result<Vec<u8>> {
        let content = self.entry_content_view()?;
        let mut copy = Vec::new();
        copy.try_reserve_exact(content.len())
            .map_err(|_| TarError::Allocation {
                size: content.len() as u64,
            })?;
        copy.extend_from_slice(content);
        Ok(copy)
    }

    /// Move to the next entry and decode its header.
    ///
    /// The header under the cursor must be valid, since its size decides how
    /// far to move.
    ///
    /// # Errors
    ///
    /// Running off the end of the buffer ([`TarError::BoundsExhausted`]) and
    /// landing on something that is not a header ([`TarError::Format`], which
    /// includes the zero blocks closing an archive) are both plain failures;
    /// see [`TarError::is_end_of_archive`]. After `BoundsExhausted` the reader
    /// is terminal and further calls keep failing.
    pub fn advance(&mut self) -> Result<&TarHeader> {
        let size = self.decode_header_at()?.size;
        let offset = self.position().unwrap_or_default();
        let span = aligned_span(size).ok_or(TarError::Decode { offset })?;

        self.step(span)?;
        debug!(from = offset, span, to = ?self.cursor, "advanced");
        self.decode_header_at()
    }

    /// Decode the header at the cursor, caching it on success and clearing
    /// the cache on failure.
    fn decode_header_at(&mut self) -> Result<&TarHeader> {
        self.header = None;
        let cursor = self.cursor.ok_or(TarError::BoundsExhausted {
            offset: self.data.len() as u64,
        })?;

        let header = TarHeader::decode(&self.data[cursor..], cursor as u64)?;
        trace!(offset = cursor, name = %header.name, size = header.size, "decoded header");
        Ok(&*self.header.insert(header))
    }

    /// Move the cursor forward by `span` bytes.
    ///
    /// This is the only place the cursor moves forward. A move that would
    /// leave the cursor at or past the end of the buffer makes the reader
    /// terminal instead.
    fn step(&mut self, span: u64) -> Result<usize> {
        let cursor = self.cursor.ok_or(TarError::BoundsExhausted {
            offset: self.data.len() as u64,
        })?;

        let next = usize::try_from(span)
            .ok()
            .and_then(|span| cursor.checked_add(span))
            .filter(|&next| next < self.data.len());

        self.header = None;
        self.cursor = next;
        next.ok_or(TarError::BoundsExhausted {
            offset: (cursor as u64).saturating_add(span),
        })
    }

    /// Byte range of the current entry's content.
    fn content_range(&mut self) -> Result<(usize, usize)> {
        let size = self.decode_header_at()?.size;
        // A decoded header implies a cursor with a full block after it.
        let offset = self.cursor.unwrap_or_default();
        let start = offset + BLOCK_SIZE;
        let available = self.data.len() - start;

        let end = usize::try_from(size)
            .ok()
            .and_then(|size| start.checked_add(size))
            .filter(|&end| end <= self.data.len())
            .ok_or(TarError::TruncatedContent {
                offset: offset as u64,
                size,
                available,
            })?;
        Ok((start, end))
    }
}

/// One entry yielded by [`Entries`].
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a> {
    pub header: TarHeader,
    /// Offset of the entry's header block in the archive.
    pub offset: u64,
    /// The entry's content, borrowed from the archive.
    pub data: &'a [u8],
}

impl Entry<'_> {
    pub fn size(&self) -> u64 {
        self.header.size
    }

    /// Bytes this entry occupies in the archive, header included.
    pub fn span(&self) -> u64 {
        // The content was sliced out of the archive, so this cannot overflow.
        aligned_span(self.header.size).unwrap_or(u64::MAX)
    }
}

/// Iterator over the entries of an archive.
///
/// Stops quietly when the walk reaches the end of the archive, whether that
/// is the end of the buffer or the zero blocks that close a tar stream. A
/// first block that is neither a header nor zeros is reported as an error, as
/// is any other failure on the way; the iterator ends after yielding it.
#[derive(Debug, Clone)]
pub struct Entries<'a> {
    reader: ArchiveReader<'a>,
    started: bool,
    done: bool,
}

impl Entries<'_> {
    fn next_header(&mut self) -> Result<TarHeader> {
        if self.started {
            Ok(*self.reader.advance()?)
        } else {
            self.started = true;
            Ok(*self.reader.current_entry()?)
        }
    }

    /// Whether a failure on the very first header still means "empty".
    fn is_empty_archive(&self, err: &TarError) -> bool {
        match err {
            TarError::BoundsExhausted { .. } => true,
            TarError::Format { offset } | TarError::TruncatedHeader { offset, .. } => {
                self.is_zero_from(*offset)
            }
            _ => false,
        }
    }

    /// Whether a failure after at least one entry is the end of the archive.
    ///
    /// A partial block of zeros is a trailer cut short, not a header.
    fn is_trailer(&self, err: &TarError) -> bool {
        match err {
            TarError::TruncatedHeader { offset, .. } => self.is_zero_from(*offset),
            err => err.is_end_of_archive(),
        }
    }

    /// Whether the block starting at `offset` is zeros as far as it goes.
    fn is_zero_from(&self, offset: u64) -> bool {
        usize::try_from(offset)
            .ok()
            .and_then(|offset| self.reader.data.get(offset..))
            .is_some_and(|rest| rest.iter().take(BLOCK_SIZE).all(|&byte| byte == 0))
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = Result<Entry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let first = !self.started;
        let header = match self.next_header() {
            Ok(header) => header,
            Err(err) => {
                self.done = true;
                let at_end = if first {
                    self.is_empty_archive(&err)
                } else {
                    self.is_trailer(&err)
                };
                return (!at_end).then_some(Err(err));
            }
        };

        let offset = self.reader.position().unwrap_or_default();
        let entry = self.reader.entry_content_view().map(|data| Entry {
            header,
            offset,
            data,
        });
        if entry.is_err() {
            self.done = true;
        }
        Some(entry)
    }
}
