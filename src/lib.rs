//! # runtar
//!
//! A read-only USTAR decoder, and a Rust untar utility built on it.
//!
//! The decoder works on an archive that is already fully in memory. An
//! [`ArchiveReader`] borrows the archive bytes and walks them one header at a
//! time: it decodes the entry name and size, hands out the entry content as a
//! borrowed slice or an owned copy, and moves on to the next header. Nothing
//! is written, modified or indexed.
//!
//! Around the decoder sit a loader for local files and HTTP URLs, a
//! [`TarExtractor`] for listing and extracting entries, and the `runtar`
//! command-line tool.
//!
//! ## Features
//!
//! - Walk USTAR (and GNU) archives held in memory, without copying
//! - Load archives from the local filesystem or HTTP/HTTPS URLs
//! - Selective extraction with glob pattern matching
//! - Verify archived entries against files on disk
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use runtar::{ArchiveReader, Load, LocalFileLoader};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let data = LocalFileLoader::new(Path::new("foo.tar"))?.load().await?;
//!
//!     let mut reader = ArchiveReader::new(&data);
//!     let header = *reader.current_entry()?;
//!     let content = reader.entry_content_copy()?;
//!     println!("{}: {} bytes", header.name, content.len());
//!
//!     while let Ok(header) = reader.advance() {
//!         println!("{}: {} bytes", header.name, header.size);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod io;
pub mod ustar;

pub use cli::Cli;
pub use io::{HttpLoader, Load, LocalFileLoader};
pub use ustar::{ArchiveReader, EntryInfo, TarError, TarExtractor, TarHeader, Verification};
