mod http;
mod local;

pub use http::HttpLoader;
pub use local::LocalFileLoader;

use anyhow::Result;
use async_trait::async_trait;

/// Trait for loading a complete archive into memory
#[async_trait]
pub trait Load: Send + Sync {
    /// Read the whole source into an owned buffer
    async fn load(&self) -> Result<Vec<u8>>;

    /// Where the data comes from, for messages
    fn source(&self) -> &str;
}
