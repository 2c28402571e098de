//! Backoffice Core Library
//!
//! This crate provides the domain models, error types and configuration shared
//! by the back-office service crates (database, storage, infrastructure, CLI).

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, CleanupConfig, Config, LogFormat, ServiceConfig, StorageConfig};
pub use error::AppError;
pub use models::File;
pub use storage_types::StorageBackend;
