mod catalog;
mod reconcile;

pub use catalog::{Catalog, CatalogError, ImageRecord};

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use common::media;
use common::storage::{BlobStore, BoxReader};

use crate::error::AppError;
use crate::utils::filename::{derive_extension, validate_flat_filename};

/// Result of a listing request.
pub struct Listing {
    pub images: Vec<ImageRecord>,
    /// True when the storage scan failed and `images` reflects the
    /// last-known catalog contents.
    pub partial: bool,
}

/// The façade over storage, catalog and reconciliation that the HTTP
/// handlers talk to.
pub struct GalleryService {
    store: Arc<dyn BlobStore>,
    catalog: Catalog,
    max_image_size: u64,
}

impl GalleryService {
    pub fn new(store: Arc<dyn BlobStore>, max_image_size: u64) -> Self {
        Self {
            store,
            catalog: Catalog::new(),
            max_image_size,
        }
    }

    /// List all known images, newest first.
    ///
    /// Reconciles the catalog against storage first so files added or
    /// removed out of band show up. A failed scan degrades to the
    /// last-known contents instead of failing the request.
    pub async fn list_images(&self) -> Listing {
        let partial = match reconcile::reconcile(&*self.store, &self.catalog).await {
            Ok(()) => false,
            Err(err) => {
                warn!("storage scan failed, serving last-known catalog: {err}");
                true
            }
        };

        Listing {
            images: self.catalog.list_sorted(),
            partial,
        }
    }

    /// Validate and store an uploaded image, then index it.
    ///
    /// Content type and payload size are rejected before any write; the
    /// bytes are durably on disk before the record becomes visible, so the
    /// catalog never references unwritten data.
    pub async fn upload_image(
        &self,
        payload: &[u8],
        declared_content_type: Option<&str>,
        declared_name: Option<&str>,
    ) -> Result<ImageRecord, AppError> {
        let content_type = declared_content_type
            .filter(|mime| media::is_allowed_mime(mime))
            .ok_or_else(|| {
                AppError::InvalidContentType(declared_content_type.unwrap_or("none").to_string())
            })?;

        if payload.len() as u64 > self.max_image_size {
            return Err(AppError::PayloadTooLarge {
                actual: payload.len() as u64,
                limit: self.max_image_size,
            });
        }

        let display_name = match declared_name {
            Some(name) => Some(
                validate_flat_filename(name)
                    .map_err(|e| AppError::Validation(e.message().into()))?
                    .to_string(),
            ),
            None => None,
        };

        let extension = derive_extension(declared_name);
        let blob = self.store.put(payload, &extension).await?;

        let record = ImageRecord {
            id: blob.id,
            display_name: display_name.unwrap_or_else(|| blob.filename.clone()),
            stored_filename: blob.filename,
            size_bytes: payload.len() as u64,
            content_type: content_type.to_string(),
            uploaded_at: Utc::now(),
        };
        self.catalog.insert(record.clone())?;

        info!(id = %record.id, name = %record.display_name, size = record.size_bytes, "image uploaded");
        Ok(record)
    }

    /// Remove an image from the catalog and storage.
    ///
    /// A file already gone from disk still counts as deleted. Any other
    /// storage failure is surfaced; the file then remains on disk and the
    /// next reconciliation re-discovers it, so nothing is silently lost.
    pub async fn delete_image(&self, id: &Uuid) -> Result<ImageRecord, AppError> {
        let record = self
            .catalog
            .remove(id)
            .ok_or_else(|| AppError::NotFound("Image not found".into()))?;

        self.store.delete(&record.stored_filename).await?;

        info!(id = %record.id, "image deleted");
        Ok(record)
    }

    /// Open a stored file for serving, returning a reader and its size.
    pub async fn open_image(&self, filename: &str) -> Result<(BoxReader, u64), AppError> {
        let size = self.store.size(filename).await?;
        let reader = self.store.get_stream(filename).await?;
        Ok((reader, size))
    }
}
