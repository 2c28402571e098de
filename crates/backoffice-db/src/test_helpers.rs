//! In-memory file record store for unit tests
//!
//! Mirrors the claim/lease semantics of [`FileRepository`](crate::FileRepository)
//! without a database, records every call, and can be told to fail specific
//! operations.

use anyhow::Result;
use async_trait::async_trait;
use backoffice_core::models::File;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::file_store::FileRecordStore;

/// A recorded call on [`InMemoryFileStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    ReleaseStaleClaims(Duration),
    ClaimExpired(i64),
    IncrementFailedAttempts(Uuid),
    SoftDelete(Uuid),
}

#[derive(Default)]
struct Failures {
    release: bool,
    claim: bool,
    increment: bool,
    soft_delete: HashSet<Uuid>,
}

#[derive(Clone, Default)]
pub struct InMemoryFileStore {
    files: Arc<Mutex<HashMap<Uuid, File>>>,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    failures: Arc<Mutex<Failures>>,
}

impl InMemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, file: File) {
        self.files.lock().unwrap().insert(file.id, file);
    }

    pub fn get(&self, file_id: Uuid) -> Option<File> {
        self.files.lock().unwrap().get(&file_id).cloned()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn soft_delete_calls(&self) -> Vec<Uuid> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::SoftDelete(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn increment_calls(&self) -> Vec<Uuid> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::IncrementFailedAttempts(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn fail_release(&self, fail: bool) {
        self.failures.lock().unwrap().release = fail;
    }

    pub fn fail_claim(&self, fail: bool) {
        self.failures.lock().unwrap().claim = fail;
    }

    pub fn fail_increment(&self, fail: bool) {
        self.failures.lock().unwrap().increment = fail;
    }

    pub fn fail_soft_delete_for(&self, file_id: Uuid) {
        self.failures.lock().unwrap().soft_delete.insert(file_id);
    }

    /// Make every operation succeed again.
    pub fn clear_failures(&self) {
        *self.failures.lock().unwrap() = Failures::default();
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl FileRecordStore for InMemoryFileStore {
    async fn release_stale_claims(&self, older_than: Duration) -> Result<u64> {
        self.record(StoreCall::ReleaseStaleClaims(older_than));
        if self.failures.lock().unwrap().release {
            anyhow::bail!("release failed: connection reset");
        }

        let now = Utc::now();
        let stale_age = chrono::Duration::from_std(older_than)?;
        let mut released = 0;
        for file in self.files.lock().unwrap().values_mut() {
            if file.has_stale_claim(now, stale_age) {
                file.claimed_at = None;
                file.updated_at = now;
                released += 1;
            }
        }
        Ok(released)
    }

    async fn claim_expired(&self, limit: i64) -> Result<Vec<File>> {
        self.record(StoreCall::ClaimExpired(limit));
        if self.failures.lock().unwrap().claim {
            anyhow::bail!("claim failed: database unavailable");
        }

        let now = Utc::now();
        let mut files = self.files.lock().unwrap();
        let mut candidates: Vec<(Option<DateTime<Utc>>, Uuid)> = files
            .values()
            .filter(|file| file.is_claimable(now))
            .map(|file| (file.expires_at, file.id))
            .collect();
        candidates.sort();
        candidates.truncate(usize::try_from(limit).unwrap_or(0));

        let mut claimed = Vec::with_capacity(candidates.len());
        for (_, id) in candidates {
            if let Some(file) = files.get_mut(&id) {
                file.claimed_at = Some(now);
                file.updated_at = now;
                claimed.push(file.clone());
            }
        }
        Ok(claimed)
    }

    async fn increment_failed_attempts(&self, file_id: Uuid) -> Result<()> {
        self.record(StoreCall::IncrementFailedAttempts(file_id));
        if self.failures.lock().unwrap().increment {
            anyhow::bail!("increment failed: connection reset");
        }

        let mut files = self.files.lock().unwrap();
        let file = files
            .get_mut(&file_id)
            .ok_or_else(|| anyhow::anyhow!("File {} not found", file_id))?;
        file.failed_attempts += 1;
        file.updated_at = Utc::now();
        Ok(())
    }

    async fn soft_delete(&self, file_id: Uuid) -> Result<()> {
        self.record(StoreCall::SoftDelete(file_id));
        if self.failures.lock().unwrap().soft_delete.contains(&file_id) {
            anyhow::bail!("soft delete failed: serialization failure");
        }

        if let Some(file) = self.files.lock().unwrap().get_mut(&file_id) {
            if file.deleted_at.is_none() {
                let now = Utc::now();
                file.deleted_at = Some(now);
                file.claimed_at = None;
                file.updated_at = now;
            }
        }
        Ok(())
    }
}

/// Build a file that expired `expired_for` ago.
pub fn expired_file(bucket: &str, storage_key: &str, expired_for: chrono::Duration) -> File {
    let now = Utc::now();
    File {
        id: Uuid::new_v4(),
        tenant_id: Uuid::new_v4(),
        bucket: bucket.to_string(),
        storage_key: storage_key.to_string(),
        original_filename: storage_key
            .rsplit('/')
            .next()
            .unwrap_or(storage_key)
            .to_string(),
        content_type: "application/octet-stream".to_string(),
        file_size: 1024,
        expires_at: Some(now - expired_for),
        deleted_at: None,
        claimed_at: None,
        failed_attempts: 0,
        created_at: now - expired_for - chrono::Duration::days(1),
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn claims_are_exclusive() {
        let store = InMemoryFileStore::new();
        for i in 0..10 {
            store.insert(expired_file(
                "uploads",
                &format!("k/{i}"),
                chrono::Duration::minutes(i + 1),
            ));
        }

        let (a, b) = tokio::join!(store.claim_expired(6), store.claim_expired(6));
        let a = a.unwrap();
        let b = b.unwrap();
        assert_eq!(a.len() + b.len(), 10);
        let ids_a: HashSet<Uuid> = a.iter().map(|f| f.id).collect();
        assert!(b.iter().all(|f| !ids_a.contains(&f.id)));
    }

    #[tokio::test]
    async fn claims_oldest_expiry_first() {
        let store = InMemoryFileStore::new();
        let newer = expired_file("uploads", "newer", chrono::Duration::minutes(1));
        let older = expired_file("uploads", "older", chrono::Duration::hours(3));
        store.insert(newer.clone());
        store.insert(older.clone());

        let claimed = store.claim_expired(1).await.unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].id, older.id);
    }

    #[tokio::test]
    async fn stale_claims_become_claimable_again() {
        let store = InMemoryFileStore::new();
        let mut file = expired_file("uploads", "a", chrono::Duration::hours(1));
        file.claimed_at = Some(Utc::now() - chrono::Duration::minutes(10));
        store.insert(file.clone());

        assert!(store.claim_expired(10).await.unwrap().is_empty());
        let released = store
            .release_stale_claims(Duration::from_secs(300))
            .await
            .unwrap();
        assert_eq!(released, 1);
        assert_eq!(store.claim_expired(10).await.unwrap()[0].id, file.id);
    }

    #[tokio::test]
    async fn fresh_claims_are_kept() {
        let store = InMemoryFileStore::new();
        let mut file = expired_file("uploads", "a", chrono::Duration::hours(1));
        file.claimed_at = Some(Utc::now() - chrono::Duration::minutes(1));
        store.insert(file);

        let released = store
            .release_stale_claims(Duration::from_secs(300))
            .await
            .unwrap();
        assert_eq!(released, 0);
    }
}
