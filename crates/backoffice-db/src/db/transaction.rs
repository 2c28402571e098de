//! Database transaction utilities
//!
//! Every file lifecycle mutation runs inside its own transaction opened by
//! [`with_transaction`], which commits on success and rolls back on error.

use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres, Transaction};

/// Boxed future returned by a transaction body.
pub type TxFuture<'a, R, E> =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<R, E>> + Send + 'a>>;

/// Execute a closure within a database transaction
///
/// This helper function begins a transaction, executes the closure,
/// and commits if successful or rolls back on error.
///
/// # Example
///
/// ```ignore
/// use backoffice_db::with_transaction;
///
/// async fn example(pool: &sqlx::PgPool) -> anyhow::Result<()> {
///     with_transaction(pool, |tx| Box::pin(async move {
///         sqlx::query("UPDATE files SET ...").execute(&mut **tx).await?;
///         Ok::<_, sqlx::Error>(())
///     })).await
/// }
/// ```
pub async fn with_transaction<F, R, E>(pool: &PgPool, f: F) -> Result<R>
where
    F: for<'a> FnOnce(&'a mut Transaction<'_, Postgres>) -> TxFuture<'a, R, E>,
    E: std::error::Error + Send + Sync + 'static,
{
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    match f(&mut tx).await {
        Ok(result) => {
            tx.commit().await.context("Failed to commit transaction")?;
            Ok(result)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "Failed to roll back transaction");
            }
            Err(anyhow::Error::from(e))
        }
    }
}
