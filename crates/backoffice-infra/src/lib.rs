//! Backoffice Infrastructure Library
//!
//! Shared infrastructure used by the back-office service processes:
//! - Telemetry initialization
//! - Expired-file cleanup engine and its background worker

#[cfg(feature = "observability-basic")]
pub mod telemetry;

#[cfg(feature = "cleanup")]
pub mod cleanup;

// Re-export commonly used types
#[cfg(feature = "cleanup")]
pub use cleanup::{BatchResult, CleanupError, CleanupService, CleanupWorker};

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, shutdown_telemetry};
