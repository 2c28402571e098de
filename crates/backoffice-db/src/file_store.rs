//! Claim/lease contract for the file record store
//!
//! The cleanup engine only depends on this trait, so it can be driven by the
//! Postgres [`FileRepository`](crate::FileRepository) in production and by an
//! in-memory store in tests.

use anyhow::Result;
use async_trait::async_trait;
use backoffice_core::models::File;
use std::time::Duration;
use uuid::Uuid;

/// Lifecycle operations the cleanup worker needs from the file record store.
///
/// Implementations must be safe to call concurrently from several processes:
/// exclusivity between workers comes entirely from [`claim_expired`].
///
/// [`claim_expired`]: FileRecordStore::claim_expired
#[async_trait]
pub trait FileRecordStore: Send + Sync {
    /// Release every claim older than `older_than` on a file that was not
    /// finalized, making it claimable again. Returns the number released.
    async fn release_stale_claims(&self, older_than: Duration) -> Result<u64>;

    /// Atomically claim up to `limit` expired, live, unclaimed files.
    ///
    /// Two concurrent callers never receive the same file.
    async fn claim_expired(&self, limit: i64) -> Result<Vec<File>>;

    /// Record one failed object deletion. The claim is left in place.
    async fn increment_failed_attempts(&self, file_id: Uuid) -> Result<()>;

    /// Set `deleted_at`. Calling it on an already deleted file is a no-op.
    async fn soft_delete(&self, file_id: Uuid) -> Result<()>;
}
