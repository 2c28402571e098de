//! Backoffice Storage Library
//!
//! Object store adapters used to remove the physical bytes of expired files.
//! It includes the Storage trait and implementations for S3 and the local filesystem.
//!
//! # Addressing
//!
//! Every object is addressed by the `(bucket, storage_key)` pair recorded on its
//! file row. Keys must not be empty, start with `/` or contain `..` segments;
//! buckets are a single path segment.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod traits;

// Re-export commonly used types
pub use backoffice_core::StorageBackend;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
