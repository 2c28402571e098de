//! Backoffice Database Layer
//!
//! PostgreSQL repositories and transaction helpers for the back-office
//! service, plus the [`FileRecordStore`] contract consumed by the expired-file
//! cleanup worker.

pub mod db;
pub mod file_store;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

use sqlx::migrate::Migrator;

// Re-exports: repositories
pub use db::FileRepository;

// Re-exports: Transaction utilities
pub use db::transaction::{with_transaction, TxFuture};

// Re-exports: store contract
pub use file_store::FileRecordStore;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Apply pending migrations to `pool`.
pub async fn run_migrations(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    use anyhow::Context;

    MIGRATOR
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");
    Ok(())
}
