use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::BufReader;
use uuid::Uuid;

use super::error::StorageError;
use super::traits::{BlobStore, BoxReader, NewBlob, StoredObject};
use crate::media;

/// Staging subdirectory for in-flight writes. Hidden names are excluded
/// from scans, so nothing under it is ever listed.
const TEMP_DIR: &str = ".tmp";

/// Filesystem-backed blob store.
///
/// Image files live flat under `root` as `{uuid}.{ext}`. Writes are staged
/// in a `.tmp` subdirectory and renamed into place, so a concurrent
/// directory scan never observes a partially written image.
pub struct FilesystemBlobStore {
    root: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    /// Open the storage directory, creating it if absent.
    pub async fn new(root: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        if let Ok(meta) = fs::metadata(&root).await
            && !meta.is_dir()
        {
            return Err(StorageError::Unavailable(format!(
                "{} exists but is not a directory",
                root.display()
            )));
        }

        fs::create_dir_all(root.join(TEMP_DIR))
            .await
            .map_err(|e| {
                StorageError::Unavailable(format!("cannot create upload directory: {e}"))
            })?;

        Ok(Self { root, max_size })
    }

    fn file_path(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    fn temp_path(&self, id: Uuid) -> PathBuf {
        self.root.join(TEMP_DIR).join(id.to_string())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put(&self, data: &[u8], extension: &str) -> Result<NewBlob, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let id = Uuid::new_v4();
        let filename = format!("{id}.{extension}");
        let temp_path = self.temp_path(id);

        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp_path, self.file_path(&filename)).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(NewBlob { id, filename })
    }

    async fn delete(&self, filename: &str) -> Result<bool, StorageError> {
        match fs::remove_file(self.file_path(filename)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<StoredObject>, StorageError> {
        let mut entries = fs::read_dir(&self.root).await?;
        let mut objects = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let filename = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    tracing::warn!("skipping non-UTF-8 name {raw:?} in upload directory");
                    continue;
                }
            };

            if filename.starts_with('.') {
                continue;
            }
            let Some((_, ext)) = filename.rsplit_once('.') else {
                continue;
            };
            if !media::is_image_extension(ext) {
                continue;
            }

            let meta = match entry.metadata().await {
                Ok(meta) => meta,
                // Deleted between readdir and stat.
                Err(_) => continue,
            };
            if !meta.is_file() {
                continue;
            }

            let modified = match meta.modified() {
                Ok(time) => DateTime::<Utc>::from(time),
                // Platform without mtime support.
                Err(_) => Utc::now(),
            };

            objects.push(StoredObject {
                filename,
                size: meta.len(),
                modified,
            });
        }

        Ok(objects)
    }

    async fn get_stream(&self, filename: &str) -> Result<BoxReader, StorageError> {
        match fs::File::open(self.file_path(filename)).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(filename.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn size(&self, filename: &str) -> Result<u64, StorageError> {
        match fs::metadata(self.file_path(filename)).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(filename.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
