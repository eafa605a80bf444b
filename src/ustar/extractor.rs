use std::path::{Component, Path};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use anyhow::{Context, Result, bail};

use super::reader::{ArchiveReader, Entry};

/// Listing information for one archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub file_name: String,
    pub size: u64,
    /// Offset of the entry's header block.
    pub offset: u64,
    /// Bytes the entry occupies, header and padding included.
    pub span: u64,
    pub is_directory: bool,
}

impl From<&Entry<'_>> for EntryInfo {
    fn from(entry: &Entry<'_>) -> Self {
        let file_name = entry.header.name.to_string_lossy();
        let is_directory = file_name.ends_with('/');
        Self {
            file_name,
            size: entry.size(),
            offset: entry.offset,
            span: entry.span(),
            is_directory,
        }
    }
}

impl EntryInfo {
    /// Whether the name stays inside the extraction directory when joined to
    /// it: relative, and no `..` components.
    pub fn is_safe_path(&self) -> bool {
        let path = Path::new(&self.file_name);
        !self.file_name.is_empty()
            && path
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    }
}

/// Outcome of comparing an archived entry with a file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Match,
    Missing,
    SizeMismatch { archived: u64, on_disk: u64 },
    /// First differing byte.
    ContentMismatch { offset: u64 },
    /// The name is absolute or climbs out of the directory; nothing was read.
    UnsafePath,
}

/// Tar archive extractor over a fully loaded archive.
pub struct TarExtractor {
    data: Vec<u8>,
}

impl TarExtractor {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// The raw archive bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// List all entries in the archive
    pub fn list_entries(&self) -> Result<Vec<EntryInfo>> {
        ArchiveReader::entries(&self.data)
            .map(|entry| Ok(EntryInfo::from(&entry?)))
            .collect::<Result<Vec<_>>>()
            .context("Not a valid tar archive")
    }

    /// Position a reader on `entry`, refusing a listing that no longer
    /// matches the header at its offset.
    fn reader_at(&self, entry: &EntryInfo) -> Result<ArchiveReader<'_>> {
        let mut reader = ArchiveReader::new(&self.data);
        let header = reader.seek(entry.offset)?;
        if header.name.to_string_lossy() != entry.file_name {
            bail!(
                "Entry at offset {} is {}, expected {}",
                entry.offset,
                header.name,
                entry.file_name
            );
        }
        Ok(reader)
    }

    /// Extract entry data to memory
    pub fn extract_to_memory(&self, entry: &EntryInfo) -> Result<Vec<u8>> {
        Ok(self.reader_at(entry)?.entry_content_copy()?)
    }

    /// Extract entry to disk
    pub async fn extract_to_file(&self, entry: &EntryInfo, output_path: &Path) -> Result<()> {
        if entry.is_directory {
            fs::create_dir_all(output_path).await?;
            return Ok(());
        }

        // Create parent directories if needed
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let data = self.extract_to_memory(entry)?;

        let mut file = fs::File::create(output_path)
            .await
            .with_context(|| format!("Failed to create {}", output_path.display()))?;
        file.write_all(&data).await?;
        debug!(path = %output_path.display(), bytes = data.len(), "wrote entry");

        Ok(())
    }

    /// Extract entry to stdout
    pub async fn extract_to_stdout(&self, entry: &EntryInfo) -> Result<()> {
        let data = self.reader_at(entry)?.entry_content_view()?;

        let mut stdout = tokio::io::stdout();
        stdout.write_all(data).await?;
        stdout.flush().await?;

        Ok(())
    }

    /// Compare an entry with the file of the same name under `dir`.
    ///
    /// Names that would resolve outside `dir` are not read.
    pub async fn verify_entry_in(&self, entry: &EntryInfo, dir: &Path) -> Result<Verification> {
        if !entry.is_safe_path() {
            return Ok(Verification::UnsafePath);
        }
        self.verify_entry(entry, &dir.join(&entry.file_name)).await
    }

    /// Compare an entry's content with the file at `path`.
    pub async fn verify_entry(&self, entry: &EntryInfo, path: &Path) -> Result<Verification> {
        let archived = self.reader_at(entry)?.entry_content_view()?;

        let on_disk = match fs::read(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Verification::Missing);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        if archived.len() != on_disk.len() {
            return Ok(Verification::SizeMismatch {
                archived: archived.len() as u64,
                on_disk: on_disk.len() as u64,
            });
        }

        Ok(archived
            .iter()
            .zip(&on_disk)
            .position(|(a, b)| a != b)
            .map_or(Verification::Match, |offset| Verification::ContentMismatch {
                offset: offset as u64,
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(file_name: &str) -> EntryInfo {
        EntryInfo {
            file_name: file_name.to_string(),
            size: 0,
            offset: 0,
            span: 512,
            is_directory: file_name.ends_with('/'),
        }
    }

    #[test]
    fn test_safe_paths() {
        assert!(info("a.txt").is_safe_path());
        assert!(info("dir/a.txt").is_safe_path());
        assert!(info("./dir/").is_safe_path());
        assert!(!info("").is_safe_path());
        assert!(!info("/etc/passwd").is_safe_path());
        assert!(!info("../up").is_safe_path());
        assert!(!info("dir/../../up").is_safe_path());
    }

    #[test]
    fn test_list_rejects_garbage() {
        let extractor = TarExtractor::new(vec![b'x'; 1024]);
        let err = extractor.list_entries().unwrap_err();
        assert_eq!(err.to_string(), "Not a valid tar archive");
    }

    #[test]
    fn test_list_empty() {
        let extractor = TarExtractor::new(vec![0u8; 1024]);
        assert!(extractor.list_entries().unwrap().is_empty());
    }
}
