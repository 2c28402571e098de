use backoffice_core::File;
use backoffice_db::FileRecordStore;
use backoffice_storage::Storage;

use super::CleanupError;

/// Delete one claimed file: object first, then the record.
///
/// On a storage failure the file's `failed_attempts` is bumped (best effort)
/// and the claim is kept, so the file is retried once the claim goes stale.
#[tracing::instrument(
    skip_all,
    fields(file_id = %file.id, tenant_id = %file.tenant_id, bucket = %file.bucket)
)]
pub(crate) async fn process_file(
    store: &dyn FileRecordStore,
    storage: &dyn Storage,
    file: &File,
) -> Result<(), CleanupError> {
    tracing::debug!(
        storage_key = %file.storage_key,
        expires_at = ?file.expires_at,
        failed_attempts = file.failed_attempts,
        "Deleting expired file"
    );

    if let Err(source) = storage.delete_file(&file.bucket, &file.storage_key).await {
        if let Err(e) = store.increment_failed_attempts(file.id).await {
            tracing::warn!(error = %e, "Failed to record failed cleanup attempt");
        }
        return Err(CleanupError::Storage {
            file_id: file.id,
            source,
        });
    }

    store
        .soft_delete(file.id)
        .await
        .map_err(|source| CleanupError::Finalize {
            file_id: file.id,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_db::test_helpers::{expired_file, InMemoryFileStore, StoreCall};
    use backoffice_storage::test_helpers::MockStorage;

    fn setup() -> (InMemoryFileStore, MockStorage, File) {
        let store = InMemoryFileStore::new();
        let storage = MockStorage::new();
        let file = expired_file("uploads", "tenant/report.pdf", chrono::Duration::hours(1));
        store.insert(file.clone());
        storage.put(&file.bucket, &file.storage_key, vec![0; 16]);
        (store, storage, file)
    }

    #[tokio::test]
    async fn deletes_object_then_record() {
        let (store, storage, file) = setup();

        process_file(&store, &storage, &file).await.unwrap();

        assert!(!storage.has_object(&file.bucket, &file.storage_key));
        assert_eq!(store.calls(), vec![StoreCall::SoftDelete(file.id)]);
        assert!(store.get(file.id).unwrap().is_deleted());
    }

    #[tokio::test]
    async fn storage_failure_increments_attempts_and_keeps_record() {
        let (store, storage, file) = setup();
        storage.fail_deletes_for(&file.storage_key);

        let err = process_file(&store, &storage, &file).await.unwrap_err();

        assert!(matches!(err, CleanupError::Storage { file_id, .. } if file_id == file.id));
        assert_eq!(store.calls(), vec![StoreCall::IncrementFailedAttempts(file.id)]);
        let record = store.get(file.id).unwrap();
        assert_eq!(record.failed_attempts, 1);
        assert!(!record.is_deleted());
    }

    #[tokio::test]
    async fn increment_failure_does_not_mask_storage_error() {
        let (store, storage, file) = setup();
        storage.fail_deletes_for(&file.storage_key);
        store.fail_increment(true);

        let err = process_file(&store, &storage, &file).await.unwrap_err();

        assert!(matches!(err, CleanupError::Storage { .. }));
        assert!(store.soft_delete_calls().is_empty());
    }

    #[tokio::test]
    async fn finalize_failure_is_reported_without_increment() {
        let (store, storage, file) = setup();
        store.fail_soft_delete_for(file.id);

        let err = process_file(&store, &storage, &file).await.unwrap_err();

        assert!(matches!(err, CleanupError::Finalize { file_id, .. } if file_id == file.id));
        assert!(store.increment_calls().is_empty());
        assert!(!storage.has_object(&file.bucket, &file.storage_key));
        assert_eq!(store.get(file.id).unwrap().failed_attempts, 0);
    }

    #[tokio::test]
    async fn already_absent_object_still_finalizes() {
        let (store, storage, file) = setup();
        storage.delete_file(&file.bucket, &file.storage_key).await.unwrap();

        process_file(&store, &storage, &file).await.unwrap();

        assert_eq!(store.soft_delete_calls(), vec![file.id]);
    }
}
