//! Blob storage for original uploads and derived thumbnails.

mod local;

use async_trait::async_trait;
use bytes::Bytes;

pub use local::LocalBlobStore;

#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("invalid blob path: {0}")]
    InvalidPath(String),
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stores opaque binary objects under generated paths.
///
/// Paths are relative, `/`-separated and never start with `/`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `data` as `<prefix>/<filename>`, picking a free name if that one is
    /// taken. `filename` must be a single path segment. Returns the path actually written.
    async fn save(&self, prefix: &str, filename: &str, data: Bytes)
    -> Result<String, BlobStoreError>;

    async fn read(&self, path: &str) -> Result<Bytes, BlobStoreError>;

    /// Missing blobs are reported as [`BlobStoreError::NotFound`].
    async fn delete(&self, path: &str) -> Result<(), BlobStoreError>;

    async fn exists(&self, path: &str) -> Result<bool, BlobStoreError>;

    /// URL the blob can be fetched from, relative to the server root.
    fn url(&self, path: &str) -> String;
}
