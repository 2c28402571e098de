//! Storage abstraction trait
//!
//! This module defines the Storage trait that all object store adapters must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Object store adapter
///
/// Objects are addressed by `(bucket, key)` as recorded on the file row.
///
/// **Idempotent delete:** deleting an object that does not exist must return
/// `Ok(())`. The cleanup worker retries deletions after crashes and after
/// finalize failures, so a second delete of the same object is expected.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Delete the object at `key` inside `bucket`.
    async fn delete_file(&self, bucket: &str, key: &str) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
