//! USTAR archive decoding and extraction.
//!
//! ## Architecture
//!
//! - [`structures`]: header layout constants, octal decoding, block alignment
//! - [`reader`]: [`ArchiveReader`], a cursor over an in-memory archive
//! - [`extractor`]: [`TarExtractor`], listing and extraction for end users
//! - [`error`]: [`TarError`]
//!
//! ## Tar Format Overview
//!
//! A tar archive is a sequence of 512-byte blocks. Each entry is one header
//! block followed by its content, padded with zeros to a whole number of
//! blocks. The archive closes with two zero blocks.
//!
//! Archives are read from the front, one header at a time. Nothing is
//! indexed: the reader keeps only its cursor and the header under it.
//!
//! ## Limitations
//!
//! - Only the name, size and magic fields are decoded
//! - No header checksum verification
//! - No GNU long names, PAX extended headers, or prefix field
//! - No compressed archives

pub mod error;
mod extractor;
pub mod reader;
pub mod structures;

pub use error::{Result, TarError};
pub use extractor::{EntryInfo, TarExtractor, Verification};
pub use reader::{ArchiveReader, Entries, Entry};
pub use structures::*;
