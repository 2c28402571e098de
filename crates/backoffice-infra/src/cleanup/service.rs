use backoffice_core::{AppError, CleanupConfig};
use backoffice_db::FileRecordStore;
use backoffice_storage::Storage;
use std::sync::Arc;

use super::processor::process_file;
use super::{BatchResult, CleanupError};

/// Runs cleanup batches against a file record store and an object store.
#[derive(Clone)]
pub struct CleanupService {
    store: Arc<dyn FileRecordStore>,
    storage: Arc<dyn Storage>,
    config: CleanupConfig,
}

impl CleanupService {
    pub fn new(
        store: Arc<dyn FileRecordStore>,
        storage: Arc<dyn Storage>,
        config: CleanupConfig,
    ) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self {
            store,
            storage,
            config,
        })
    }

    pub fn config(&self) -> &CleanupConfig {
        &self.config
    }

    /// Run one cleanup batch.
    ///
    /// Stale claims are released first; a failure there is logged and the
    /// batch continues. A failed claim aborts the batch. Each claimed file is
    /// then processed independently, so `processed + failed` equals the
    /// number of files claimed.
    #[tracing::instrument(skip(self), fields(cleanup.batch_size = self.config.batch_size))]
    pub async fn cleanup_batch(&self) -> Result<BatchResult, CleanupError> {
        if let Err(e) = self
            .store
            .release_stale_claims(self.config.stale_claim_age())
            .await
        {
            tracing::warn!(error = %e, "Failed to release stale cleanup claims");
        }

        let files = self
            .store
            .claim_expired(self.config.batch_size)
            .await
            .map_err(CleanupError::Claim)?;

        let mut result = BatchResult::default();
        for file in &files {
            match process_file(self.store.as_ref(), self.storage.as_ref(), file).await {
                Ok(()) => result.processed += 1,
                Err(e) => {
                    tracing::error!(error = %e, file_id = %file.id, "Failed to clean up expired file");
                    result.failed += 1;
                }
            }
        }

        Ok(result)
    }
}
