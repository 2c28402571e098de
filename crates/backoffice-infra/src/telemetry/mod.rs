//! Telemetry initialization
//!
//! Installs the global `tracing` subscriber for the back-office processes.

mod init_basic;

pub use init_basic::{init_telemetry, shutdown_telemetry};
