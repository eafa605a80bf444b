use super::Load;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Local file loader
pub struct LocalFileLoader {
    path: PathBuf,
    display: String,
    size: u64,
}

impl LocalFileLoader {
    /// Check that `path` names a regular file and record its size.
    pub fn new(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Cannot open {}", path.display()))?;
        if !metadata.is_file() {
            bail!("{} is not a regular file", path.display());
        }

        Ok(Self {
            path: path.to_path_buf(),
            display: path.display().to_string(),
            size: metadata.len(),
        })
    }

    /// Size reported by the filesystem when the loader was created
    pub fn size(&self) -> u64 {
        self.size
    }
}

#[async_trait]
impl Load for LocalFileLoader {
    async fn load(&self) -> Result<Vec<u8>> {
        let data = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.display))?;

        // A file that shrank since `new` is a short read
        if (data.len() as u64) < self.size {
            bail!(
                "Short read from {}: expected {} bytes, got {}",
                self.display,
                self.size,
                data.len()
            );
        }

        Ok(data)
    }

    fn source(&self) -> &str {
        &self.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foo.tar");
        std::fs::write(&path, b"not really a tar").unwrap();

        let loader = LocalFileLoader::new(&path).unwrap();
        assert_eq!(loader.size(), 16);
        assert_eq!(loader.load().await.unwrap(), b"not really a tar");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(LocalFileLoader::new(&dir.path().join("absent.tar")).is_err());
    }

    #[test]
    fn test_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalFileLoader::new(dir.path()).err().unwrap();
        assert!(err.to_string().ends_with("is not a regular file"));
    }

    #[tokio::test]
    async fn test_short_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shrinks.tar");
        std::fs::write(&path, vec![0u8; 1024]).unwrap();

        let loader = LocalFileLoader::new(&path).unwrap();
        std::fs::write(&path, vec![0u8; 10]).unwrap();
        let err = loader.load().await.unwrap_err();
        assert!(err.to_string().starts_with("Short read"));
    }
}
