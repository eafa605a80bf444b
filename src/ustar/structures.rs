//! USTAR header layout and field decoding.
//!
//! Only the fields needed to walk an archive are decoded:
//!
//! | Offset | Size | Field          | Decoded as                        |
//! |--------|------|----------------|-----------------------------------|
//! | 0      | 100  | name           | [`EntryName`], bounded, verbatim  |
//! | 100    | 24   | mode, uid, gid | skipped                           |
//! | 124    | 12   | size           | ASCII octal, `u64`                |
//! | 257    | 5    | magic          | must be `ustar`                   |
//!
//! Everything else in the 512-byte block (mtime, checksum, typeflag, link
//! name, owner names, prefix) is ignored.

use std::fmt;

use super::error::{Result, TarError};

/// Size of a tar header block, and the unit all content is padded to.
pub const BLOCK_SIZE: usize = 512;

/// Length of the name field.
pub const NAME_LEN: usize = 100;

/// Offset of the size field (after name, mode, uid and gid).
pub const SIZE_OFFSET: usize = NAME_LEN + 3 * 8;

/// Length of the size field.
pub const SIZE_LEN: usize = 12;

/// Offset of the magic field.
pub const MAGIC_OFFSET: usize = 257;

/// The part of the magic that is checked. Covers both the POSIX `"ustar\0"`
/// and the GNU `"ustar "` spellings.
pub const MAGIC: &[u8; 5] = b"ustar";

const _: () = assert!(SIZE_OFFSET == 124);

/// Parse an ASCII octal number.
///
/// Leading whitespace is skipped, then digits are consumed until the first
/// byte that is not `0`-`7` or the end of `field`. Returns `None` when no
/// digit is found or the value does not fit in a `u64`.
pub fn parse_octal(field: &[u8]) -> Option<u64> {
    let start = field.iter().position(|c| !c.is_ascii_whitespace())?;
    let digits = &field[start..];
    let len = digits
        .iter()
        .position(|c| !(b'0'..=b'7').contains(c))
        .unwrap_or(digits.len());
    if len == 0 {
        return None;
    }

    digits[..len].iter().try_fold(0u64, |acc, &c| {
        acc.checked_mul(8)?.checked_add(u64::from(c - b'0'))
    })
}

/// Bytes an entry occupies in the archive: its header block plus its content
/// rounded up to whole blocks.
///
/// Never less than one block, so a zero-length entry still moves the cursor.
/// Returns `None` on overflow.
pub fn aligned_span(size: u64) -> Option<u64> {
    let block = BLOCK_SIZE as u64;
    let raw = size.checked_add(block)?.checked_add(block - 1)?;
    Some(raw / block * block)
}

/// The name field of a header.
///
/// Holds the bytes of the field up to the first NUL, or all 100 bytes when
/// the field has no NUL. A full-width name carries no terminator, so callers
/// must go through [`as_bytes`](Self::as_bytes) and never scan for one.
#[derive(Clone, Copy)]
pub struct EntryName {
    bytes: [u8; NAME_LEN],
    len: usize,
}

impl EntryName {
    /// Copy a name out of a raw name field, truncating at the first NUL.
    pub fn from_field(field: &[u8]) -> Self {
        let field = &field[..field.len().min(NAME_LEN)];
        let len = field.iter().position(|&c| c == 0).unwrap_or(field.len());
        let mut bytes = [0u8; NAME_LEN];
        bytes[..len].copy_from_slice(&field[..len]);
        Self { bytes, len }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The name as text, with invalid UTF-8 replaced.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }
}

impl PartialEq for EntryName {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for EntryName {}

impl PartialEq<[u8]> for EntryName {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl PartialEq<&[u8]> for EntryName {
    fn eq(&self, other: &&[u8]) -> bool {
        self.as_bytes() == *other
    }
}

impl PartialEq<str> for EntryName {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for EntryName {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl fmt::Debug for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

/// Decoded header metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TarHeader {
    pub name: EntryName,
    pub size: u64,
}

impl TarHeader {
    /// Decode the header block at the start of `block`.
    ///
    /// `offset` is where `block` starts in the archive and is only used for
    /// error reporting.
    pub fn decode(block: &[u8], offset: u64) -> Result<Self> {
        if block.len() < BLOCK_SIZE {
            return Err(TarError::TruncatedHeader {
                offset,
                available: block.len(),
            });
        }

        // Magic first: a zero block must read as "no header", not as a bad size.
        if &block[MAGIC_OFFSET..MAGIC_OFFSET + MAGIC.len()] != MAGIC {
            return Err(TarError::Format { offset });
        }

        let name = EntryName::from_field(&block[..NAME_LEN]);
        let size = parse_octal(&block[SIZE_OFFSET..SIZE_OFFSET + SIZE_LEN])
            .ok_or(TarError::Decode { offset })?;

        Ok(Self { name, size })
    }

    /// Bytes from this header to the next one.
    pub fn span(&self) -> Option<u64> {
        aligned_span(self.size)
    }
}
