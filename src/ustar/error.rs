//! Error types for USTAR decoding.

use thiserror::Error;

use super::structures::BLOCK_SIZE;

/// Errors reported by [`ArchiveReader`](super::ArchiveReader) and the header
/// decoding primitives.
///
/// Offsets are byte offsets of the header block within the archive buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TarError {
    /// No source buffer was supplied.
    #[error("no archive data supplied")]
    InvalidInput,

    /// The `ustar` magic is missing at the expected header offset.
    ///
    /// This is also what the zero blocks terminating a tar stream look like.
    #[error("no ustar header at offset {offset}")]
    Format { offset: u64 },

    /// The size field holds no octal digits, or a value too large to address.
    #[error("invalid size field in header at offset {offset}")]
    Decode { offset: u64 },

    /// The cursor has moved at or past the end of the archive.
    #[error("end of archive at offset {offset}")]
    BoundsExhausted { offset: u64 },

    /// Memory for an owned copy of the entry content could not be reserved.
    #[error("failed to allocate {size} bytes for entry content")]
    Allocation { size: u64 },

    /// Fewer than one header block remains at the cursor.
    #[error("truncated header at offset {offset}: {available} of {BLOCK_SIZE} bytes present")]
    TruncatedHeader { offset: u64, available: usize },

    /// The declared content size runs past the end of the buffer.
    #[error("truncated content for header at offset {offset}: {size} bytes declared, {available} present")]
    TruncatedContent {
        offset: u64,
        size: u64,
        available: usize,
    },
}

impl TarError {
    /// Whether this failure means "no further entry here".
    ///
    /// A reader that ran off the end of its buffer and a reader that landed on
    /// something without a `ustar` magic are not told apart: both end a walk
    /// over the archive.
    pub fn is_end_of_archive(&self) -> bool {
        matches!(self, Self::BoundsExhausted { .. } | Self::Format { .. })
    }
}

/// Result type for tar decoding operations.
pub type Result<T> = std::result::Result<T, TarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_of_archive_grouping() {
        assert!(TarError::BoundsExhausted { offset: 1024 }.is_end_of_archive());
        assert!(TarError::Format { offset: 1024 }.is_end_of_archive());
        assert!(!TarError::Decode { offset: 0 }.is_end_of_archive());
        assert!(!TarError::InvalidInput.is_end_of_archive());
        assert!(
            !TarError::TruncatedHeader {
                offset: 0,
                available: 10
            }
            .is_end_of_archive()
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            TarError::Format { offset: 512 }.to_string(),
            "no ustar header at offset 512"
        );
        assert_eq!(
            TarError::TruncatedHeader {
                offset: 0,
                available: 100
            }
            .to_string(),
            "truncated header at offset 0: 100 of 512 bytes present"
        );
    }
}
