use uuid::Uuid;

use common::media;
use common::storage::{BlobStore, StorageError, StoredObject};

use super::catalog::{Catalog, ImageRecord};

/// Merge filesystem reality into the catalog.
///
/// Storage is the source of truth for which images exist; the catalog is
/// the source of truth for identifiers and display metadata once assigned.
/// Runs before every listing so the catalog self-heals after restarts and
/// out-of-band file changes.
pub(super) async fn reconcile(
    store: &dyn BlobStore,
    catalog: &Catalog,
) -> Result<(), StorageError> {
    let objects = store.list().await?;
    catalog.merge_scan(&objects, synthesize_record);
    Ok(())
}

/// Build a record for a file that has no catalog entry, e.g. one placed in
/// the upload directory out of band or uploaded before a restart.
fn synthesize_record(object: &StoredObject) -> ImageRecord {
    ImageRecord {
        id: Uuid::new_v4(),
        display_name: object.filename.clone(),
        stored_filename: object.filename.clone(),
        size_bytes: object.size,
        content_type: media::mime_for_filename(&object.filename),
        // The file's mtime, not "now": repeated scans must not reshuffle
        // the listing order.
        uploaded_at: object.modified,
    }
}
