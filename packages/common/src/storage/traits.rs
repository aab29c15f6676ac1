use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::AsyncRead;
use uuid::Uuid;

use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// A freshly written blob: the generated identifier and the filename
/// derived from it.
#[derive(Debug, Clone)]
pub struct NewBlob {
    pub id: Uuid,
    pub filename: String,
}

/// Metadata for one stored image file, as observed on disk.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub filename: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Durable storage of raw image bytes under generated filenames.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `data` under a freshly generated `{id}.{extension}` filename.
    ///
    /// The write is atomic: a failed call leaves no partial file behind, and
    /// a concurrent [`list`](BlobStore::list) never observes one.
    async fn put(&self, data: &[u8], extension: &str) -> Result<NewBlob, StorageError>;

    /// Remove a stored file.
    ///
    /// Returns `false` (not an error) when the file was already absent.
    async fn delete(&self, filename: &str) -> Result<bool, StorageError>;

    /// Enumerate stored image files. Each call re-scans the directory;
    /// files without a recognized image extension are excluded.
    async fn list(&self) -> Result<Vec<StoredObject>, StorageError>;

    /// Open a stored file as a streaming async reader.
    async fn get_stream(&self, filename: &str) -> Result<BoxReader, StorageError>;

    /// Size of a stored file in bytes.
    async fn size(&self, filename: &str) -> Result<u64, StorageError>;
}
