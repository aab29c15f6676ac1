use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use common::storage::StoredObject;

/// One catalog entry's full metadata.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    /// Stable identifier, unique across the catalog's lifetime.
    pub id: Uuid,
    /// Filename supplied by the uploader. Display only, never used on disk.
    pub display_name: String,
    /// Generated on-disk filename, the only name used against storage.
    pub stored_filename: String,
    pub size_bytes: u64,
    pub content_type: String,
    /// Sole sort key for listings (descending).
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate image id {0}")]
    DuplicateId(Uuid),
}

/// In-memory index of known images, keyed by id.
///
/// A single map-wide lock covers all access: reads share it, every mutation
/// takes it exclusively. A poisoned lock is recovered with `into_inner` —
/// no catalog operation can leave the map partially mutated.
#[derive(Default)]
pub struct Catalog {
    images: RwLock<HashMap<Uuid, ImageRecord>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, ImageRecord>> {
        self.images.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, ImageRecord>> {
        self.images.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a newly uploaded record.
    pub fn insert(&self, record: ImageRecord) -> Result<(), CatalogError> {
        let mut images = self.write();

        if images.contains_key(&record.id) {
            return Err(CatalogError::DuplicateId(record.id));
        }

        // A reconciliation scan racing this upload may already have
        // synthesized a record for the just-written file. The upload's
        // record carries the real display name and content type; it wins,
        // keeping exactly one record per stored file.
        images.retain(|_, existing| existing.stored_filename != record.stored_filename);

        images.insert(record.id, record);
        Ok(())
    }

    /// Remove and return a record, or `None` if the id is unknown.
    pub fn remove(&self, id: &Uuid) -> Option<ImageRecord> {
        self.write().remove(id)
    }

    /// All records, newest upload first. Equal timestamps order by id
    /// descending so repeated listings agree.
    pub fn list_sorted(&self) -> Vec<ImageRecord> {
        let mut records: Vec<ImageRecord> = self.read().values().cloned().collect();
        records.sort_by(|a, b| {
            b.uploaded_at
                .cmp(&a.uploaded_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        records
    }

    /// Look up the record backing a stored filename.
    pub fn find_by_stored_filename(&self, filename: &str) -> Option<ImageRecord> {
        self.read()
            .values()
            .find(|r| r.stored_filename == filename)
            .cloned()
    }

    /// Merge a storage scan into the catalog.
    ///
    /// Under one write lock: drops records whose backing file is gone, then
    /// inserts a synthesized record for every file not yet represented.
    /// Membership is re-checked here rather than at scan time, so an upload
    /// landing mid-scan is neither duplicated nor dropped.
    pub fn merge_scan(
        &self,
        objects: &[StoredObject],
        synthesize: impl Fn(&StoredObject) -> ImageRecord,
    ) {
        let mut images = self.write();

        let on_disk: HashSet<&str> = objects.iter().map(|o| o.filename.as_str()).collect();
        images.retain(|_, record| on_disk.contains(record.stored_filename.as_str()));

        let known: HashSet<String> = images
            .values()
            .map(|r| r.stored_filename.clone())
            .collect();
        for object in objects {
            if !known.contains(&object.filename) {
                let record = synthesize(object);
                images.insert(record.id, record);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
