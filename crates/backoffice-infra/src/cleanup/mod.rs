//! Expired-file cleanup
//!
//! [`CleanupService`] runs one batch: release stale claims, claim expired
//! files, delete each object and soft-delete its record. [`CleanupWorker`]
//! drives the service on a fixed interval until cancelled.
//!
//! Deletion is at-least-once. A crash between the object delete and the
//! soft delete leaves the claim to go stale, after which the file is claimed
//! and deleted again.

mod processor;
mod service;
mod worker;

pub use service::CleanupService;
pub use worker::CleanupWorker;

use backoffice_storage::StorageError;
use uuid::Uuid;

/// Cleanup errors
#[derive(Debug, thiserror::Error)]
pub enum CleanupError {
    /// Claiming expired files failed; the batch did nothing.
    #[error("Failed to claim expired files: {0:#}")]
    Claim(#[source] anyhow::Error),

    #[error("Failed to delete object for file {file_id}: {source}")]
    Storage {
        file_id: Uuid,
        #[source]
        source: StorageError,
    },

    /// The object is gone but the record could not be soft-deleted.
    #[error("Failed to finalize file {file_id}: {source:#}")]
    Finalize {
        file_id: Uuid,
        #[source]
        source: anyhow::Error,
    },
}

/// Outcome counts of a single batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub processed: usize,
    pub failed: usize,
}

impl BatchResult {
    pub fn is_empty(&self) -> bool {
        self.processed == 0 && self.failed == 0
    }

    pub fn total(&self) -> usize {
        self.processed + self.failed
    }
}
