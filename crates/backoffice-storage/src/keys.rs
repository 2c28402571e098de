//! Bucket and key validation shared by all backends.

use crate::traits::{StorageError, StorageResult};

/// Reject keys that are empty, absolute or contain `..` segments.
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.starts_with('/') || key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(format!(
            "Storage key contains invalid characters: {}",
            key
        )));
    }
    Ok(())
}

/// Buckets are single path segments.
pub(crate) fn validate_bucket(bucket: &str) -> StorageResult<()> {
    if bucket.is_empty() || bucket.contains('/') || bucket == "." || bucket == ".." {
        return Err(StorageError::InvalidKey(format!(
            "Invalid bucket name: {:?}",
            bucket
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_tenant_scoped_keys() {
        assert!(validate_key("tenants/42/invoices/2024-01.pdf").is_ok());
        assert!(validate_key("file..with..dots.txt").is_ok());
    }

    #[test]
    fn rejects_traversal_and_absolute_keys() {
        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("a/../../b").is_err());
    }

    #[test]
    fn rejects_nested_buckets() {
        assert!(validate_bucket("uploads").is_ok());
        assert!(validate_bucket("").is_err());
        assert!(validate_bucket("a/b").is_err());
        assert!(validate_bucket("..").is_err());
    }
}
