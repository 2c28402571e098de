use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use std::time::Duration;
use uuid::Uuid;

use backoffice_core::models::File;

use crate::db::transaction::with_transaction;
use crate::file_store::FileRecordStore;

const FILE_COLUMNS: &str = r#"
    id,
    tenant_id,
    bucket,
    storage_key,
    original_filename,
    content_type,
    file_size,
    expires_at,
    deleted_at,
    claimed_at,
    failed_attempts,
    created_at,
    updated_at
"#;

/// PostgreSQL file record store.
///
/// Claims are leases recorded in `files.claimed_at`; the claim query locks
/// candidate rows with `FOR UPDATE SKIP LOCKED` so concurrent workers in
/// different processes never pick the same file.
#[derive(Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a file by id, including soft-deleted rows.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    pub async fn get(&self, file_id: Uuid) -> Result<Option<File>> {
        let file = sqlx::query_as::<Postgres, File>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE id = $1"
        ))
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch file")?;

        Ok(file)
    }

    /// Number of files currently waiting for cleanup (expired and live).
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    pub async fn count_expired_pending(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM files
            WHERE expires_at IS NOT NULL
                AND expires_at <= NOW()
                AND deleted_at IS NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to count expired files")?;

        Ok(count)
    }
}

#[async_trait]
impl FileRecordStore for FileRepository {
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "update"))]
    async fn release_stale_claims(&self, older_than: Duration) -> Result<u64> {
        let age_secs = older_than.as_secs_f64();

        let released = with_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                let result = sqlx::query(
                    r#"
                    UPDATE files
                    SET claimed_at = NULL,
                        updated_at = NOW()
                    WHERE claimed_at IS NOT NULL
                        AND deleted_at IS NULL
                        AND claimed_at < NOW() - make_interval(secs => $1)
                    "#,
                )
                .bind(age_secs)
                .execute(&mut **tx)
                .await?;
                Ok::<_, sqlx::Error>(result.rows_affected())
            })
        })
        .await
        .context("Failed to release stale file claims")?;

        if released > 0 {
            tracing::info!(released, age_secs, "Released stale file claims");
        }

        Ok(released)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "update"))]
    async fn claim_expired(&self, limit: i64) -> Result<Vec<File>> {
        let sql = format!(
            r#"
            WITH candidates AS (
                SELECT id FROM files
                WHERE expires_at IS NOT NULL
                    AND expires_at <= NOW()
                    AND deleted_at IS NULL
                    AND claimed_at IS NULL
                ORDER BY expires_at ASC
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE files
            SET claimed_at = NOW(),
                updated_at = NOW()
            FROM candidates
            WHERE files.id = candidates.id
            RETURNING {}
            "#,
            FILE_COLUMNS
                .split(',')
                .map(|column| format!("files.{}", column.trim()))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut files = with_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                sqlx::query_as::<Postgres, File>(&sql)
                    .bind(limit)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
        .context("Failed to claim expired files")?;

        // RETURNING does not preserve the CTE ordering.
        files.sort_by_key(|file| file.expires_at);

        tracing::debug!(claimed = files.len(), limit, "Claimed expired files");

        Ok(files)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "update"))]
    async fn increment_failed_attempts(&self, file_id: Uuid) -> Result<()> {
        let updated = with_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                let result = sqlx::query(
                    r#"
                    UPDATE files
                    SET failed_attempts = failed_attempts + 1,
                        updated_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(file_id)
                .execute(&mut **tx)
                .await?;
                Ok::<_, sqlx::Error>(result.rows_affected())
            })
        })
        .await
        .context("Failed to increment failed attempts")?;

        if updated == 0 {
            anyhow::bail!("File {} not found", file_id);
        }

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "update"))]
    async fn soft_delete(&self, file_id: Uuid) -> Result<()> {
        let updated = with_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                let result = sqlx::query(
                    r#"
                    UPDATE files
                    SET deleted_at = NOW(),
                        claimed_at = NULL,
                        updated_at = NOW()
                    WHERE id = $1
                        AND deleted_at IS NULL
                    "#,
                )
                .bind(file_id)
                .execute(&mut **tx)
                .await?;
                Ok::<_, sqlx::Error>(result.rows_affected())
            })
        })
        .await
        .context("Failed to soft delete file")?;

        if updated == 0 {
            tracing::debug!(file_id = %file_id, "File already soft deleted or missing");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_columns_cover_the_model() {
        let columns: Vec<&str> = FILE_COLUMNS.split(',').map(str::trim).collect();
        assert_eq!(columns.len(), 13);
        for column in ["id", "bucket", "storage_key", "claimed_at", "failed_attempts"] {
            assert!(columns.contains(&column), "missing column {column}");
        }
    }
}
