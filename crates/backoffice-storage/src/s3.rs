use crate::keys::{validate_bucket, validate_key};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::ObjectStoreExt;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

type DynObjectStore = Arc<dyn object_store::ObjectStore>;

/// S3 storage implementation
///
/// One client per bucket is built lazily from the environment credentials
/// plus the configured region/endpoint, then cached.
pub struct S3Storage {
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    stores: RwLock<HashMap<String, DynObjectStore>>,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub fn new(region: String, endpoint_url: Option<String>) -> StorageResult<Self> {
        if region.trim().is_empty() {
            return Err(StorageError::ConfigError("S3 region is empty".to_string()));
        }

        Ok(S3Storage {
            region,
            endpoint_url,
            stores: RwLock::new(HashMap::new()),
        })
    }

    /// Use `store` for every request against `bucket` instead of building an S3 client.
    pub fn with_store(self, bucket: impl Into<String>, store: DynObjectStore) -> Self {
        if let Ok(mut stores) = self.stores.write() {
            stores.insert(bucket.into(), store);
        }
        self
    }

    fn store_for(&self, bucket: &str) -> StorageResult<DynObjectStore> {
        validate_bucket(bucket)?;

        if let Some(store) = self
            .stores
            .read()
            .map_err(|_| StorageError::BackendError("S3 client cache poisoned".to_string()))?
            .get(bucket)
        {
            return Ok(store.clone());
        }

        let mut builder = AmazonS3Builder::from_env()
            .with_region(self.region.clone())
            .with_bucket_name(bucket.to_string());

        if let Some(ref endpoint) = self.endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store: DynObjectStore = Arc::new(
            builder
                .build()
                .map_err(|e| StorageError::ConfigError(e.to_string()))?,
        );

        let mut stores = self
            .stores
            .write()
            .map_err(|_| StorageError::BackendError("S3 client cache poisoned".to_string()))?;
        Ok(stores.entry(bucket.to_string()).or_insert(store).clone())
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn delete_file(&self, bucket: &str, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        let store = self.store_for(bucket)?;
        let start = std::time::Instant::now();
        let location = Path::from(key.to_string());

        match store.delete(&location).await {
            Ok(()) => {
                tracing::info!(
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete successful"
                );
                Ok(())
            }
            Err(ObjectStoreError::NotFound { .. }) => {
                tracing::debug!(bucket = %bucket, key = %key, "S3 object already absent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                Err(StorageError::DeleteFailed(e.to_string()))
            }
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
