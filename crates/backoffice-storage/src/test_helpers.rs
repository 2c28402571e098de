//! In-memory Storage for testing
//!
//! Lets cleanup tests run without S3 or a filesystem and assert on the
//! exact deletions that were attempted.

use crate::{Storage, StorageBackend, StorageError, StorageResult};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock storage implementation that keeps objects in memory
#[derive(Clone)]
pub struct MockStorage {
    objects: Arc<Mutex<HashMap<(String, String), Vec<u8>>>>,
    failing_keys: Arc<Mutex<HashSet<String>>>,
    delete_calls: Arc<Mutex<Vec<(String, String)>>>,
    delete_delay: Arc<Mutex<Option<Duration>>>,
    backend_type: StorageBackend,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::with_backend(StorageBackend::S3)
    }

    pub fn with_backend(backend_type: StorageBackend) -> Self {
        Self {
            objects: Arc::new(Mutex::new(HashMap::new())),
            failing_keys: Arc::new(Mutex::new(HashSet::new())),
            delete_calls: Arc::new(Mutex::new(Vec::new())),
            delete_delay: Arc::new(Mutex::new(None)),
            backend_type,
        }
    }

    /// Set an object in the mock storage
    pub fn put(&self, bucket: &str, key: &str, data: Vec<u8>) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), data);
    }

    pub fn has_object(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .contains_key(&(bucket.to_string(), key.to_string()))
    }

    /// Make every delete of `key` fail until cleared
    pub fn fail_deletes_for(&self, key: &str) {
        self.failing_keys.lock().unwrap().insert(key.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing_keys.lock().unwrap().clear();
    }

    /// Sleep inside each delete. Uses tokio time, so it follows a paused clock.
    pub fn set_delete_delay(&self, delay: Duration) {
        *self.delete_delay.lock().unwrap() = Some(delay);
    }

    /// Every `(bucket, key)` passed to `delete_file`, in call order.
    pub fn delete_calls(&self) -> Vec<(String, String)> {
        self.delete_calls.lock().unwrap().clone()
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn delete_file(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.delete_calls
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string()));

        let delay = *self.delete_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing_keys.lock().unwrap().contains(key) {
            return Err(StorageError::DeleteFailed(format!(
                "simulated failure for {}",
                key
            )));
        }

        self.objects
            .lock()
            .unwrap()
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        self.backend_type
    }
}
