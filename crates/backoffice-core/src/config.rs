//! Configuration module
//!
//! Configuration for the back-office service processes: database pool,
//! object storage backend and the expired-file cleanup worker. Values are read
//! from the environment (optionally seeded from a `.env` file).

use std::env;
use std::time::Duration;

use crate::error::AppError;
use crate::storage_types::StorageBackend;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;

// Cleanup worker defaults
const FILE_CLEANUP_INTERVAL_SECS: u64 = 300;
const FILE_CLEANUP_BATCH_SIZE: i64 = 50;
const FILE_CLEANUP_STALE_CLAIM_SECS: u64 = 300;
const MAX_CLEANUP_INTERVAL_SECS: u64 = 24 * 60 * 60;
const MAX_STALE_CLAIM_SECS: u64 = 7 * 24 * 60 * 60;

/// Log output format for the tracing subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Base configuration shared by every process
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub log_format: LogFormat,
}

/// Object storage configuration
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
}

/// Expired-file cleanup worker configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CleanupConfig {
    pub enabled: bool,
    /// Seconds between two scheduled batches.
    pub interval_secs: u64,
    /// Maximum number of files claimed per batch.
    pub batch_size: i64,
    /// Seconds after which an unfinalized claim is released.
    pub stale_claim_secs: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: FILE_CLEANUP_INTERVAL_SECS,
            batch_size: FILE_CLEANUP_BATCH_SIZE,
            stale_claim_secs: FILE_CLEANUP_STALE_CLAIM_SECS,
        }
    }
}

impl CleanupConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn stale_claim_age(&self) -> Duration {
        Duration::from_secs(self.stale_claim_secs)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.interval_secs == 0 {
            return Err(AppError::Config(
                "FILE_CLEANUP_INTERVAL_SECS must be greater than 0".to_string(),
            ));
        }
        if self.batch_size <= 0 {
            return Err(AppError::Config(
                "FILE_CLEANUP_BATCH_SIZE must be greater than 0".to_string(),
            ));
        }
        if self.stale_claim_secs == 0 {
            return Err(AppError::Config(
                "FILE_CLEANUP_STALE_CLAIM_SECS must be greater than 0".to_string(),
            ));
        }
        if self.interval_secs > MAX_CLEANUP_INTERVAL_SECS {
            return Err(AppError::Config(format!(
                "FILE_CLEANUP_INTERVAL_SECS must be at most {}",
                MAX_CLEANUP_INTERVAL_SECS
            )));
        }
        if self.stale_claim_secs > MAX_STALE_CLAIM_SECS {
            return Err(AppError::Config(format!(
                "FILE_CLEANUP_STALE_CLAIM_SECS must be at most {}",
                MAX_STALE_CLAIM_SECS
            )));
        }
        Ok(())
    }

    fn from_vars(var: &impl Fn(&str) -> Option<String>) -> Self {
        Self {
            enabled: var("FILE_CLEANUP_ENABLED")
                .map(|s| s.to_lowercase().parse().unwrap_or(true))
                .unwrap_or(true),
            interval_secs: parse_or(var, "FILE_CLEANUP_INTERVAL_SECS", FILE_CLEANUP_INTERVAL_SECS),
            batch_size: parse_or(var, "FILE_CLEANUP_BATCH_SIZE", FILE_CLEANUP_BATCH_SIZE),
            stale_claim_secs: parse_or(
                var,
                "FILE_CLEANUP_STALE_CLAIM_SECS",
                FILE_CLEANUP_STALE_CLAIM_SECS,
            ),
        }
    }
}

/// Service process configuration.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub base: BaseConfig,
    pub storage: StorageConfig,
    pub cleanup: CleanupConfig,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ServiceConfig>);

impl Config {
    fn inner(&self) -> &ServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.inner().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn from_env() -> Result<Self, AppError> {
        let config = ServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.inner().validate()
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn database_url(&self) -> &str {
        &self.inner().base.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn log_format(&self) -> LogFormat {
        self.inner().base.log_format
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage.backend
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().storage.s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().storage.s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.inner().storage.aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().storage.local_storage_path.as_deref()
    }

    pub fn cleanup(&self) -> &CleanupConfig {
        &self.inner().cleanup
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let log_format = match var("LOG_FORMAT").map(|s| s.to_lowercase()).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let base = BaseConfig {
            environment,
            database_url: var("DATABASE_URL")
                .ok_or_else(|| AppError::Config("DATABASE_URL must be set".to_string()))?,
            db_max_connections: parse_or(&var, "DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: parse_or(&var, "DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            log_format,
        };

        let backend = match var("STORAGE_BACKEND") {
            Some(s) => s
                .parse::<StorageBackend>()
                .map_err(|e| AppError::Config(e.to_string()))?,
            None => StorageBackend::S3,
        };

        let storage = StorageConfig {
            backend,
            s3_region: var("S3_REGION"),
            s3_endpoint: var("S3_ENDPOINT"),
            aws_region: var("AWS_REGION"),
            local_storage_path: var("LOCAL_STORAGE_PATH"),
        };

        Ok(ServiceConfig {
            base,
            storage,
            cleanup: CleanupConfig::from_vars(&var),
        })
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !self.base.database_url.starts_with("postgres://")
            && !self.base.database_url.starts_with("postgresql://")
        {
            return Err(AppError::Config(
                "DATABASE_URL must be a valid PostgreSQL connection string".to_string(),
            ));
        }

        match self.storage.backend {
            StorageBackend::S3 => {
                if self.storage.s3_region.is_none() && self.storage.aws_region.is_none() {
                    return Err(AppError::Config(
                        "STORAGE_BACKEND=s3 requires S3_REGION or AWS_REGION to be set".to_string(),
                    ));
                }
            }
            StorageBackend::Local => {
                if self.storage.local_storage_path.is_none() {
                    return Err(AppError::Config(
                        "STORAGE_BACKEND=local requires LOCAL_STORAGE_PATH to be set".to_string(),
                    ));
                }
            }
        }

        self.cleanup.validate()
    }
}

fn parse_or<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> T {
    var(name)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
