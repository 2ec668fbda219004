//! PostgreSQL adapter

use super::{AccessLog, VideoStore};
use crate::error::{StoreError, StoreResult};
use crate::models::{NewAccessLogEntry, PayloadId, VideoRecord};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info};

/// Video store and access log backed by a shared `PgPool`
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded `migrations/postgres` schema
    pub async fn migrate(&self) -> StoreResult<()> {
        debug!("Running registry migrations (postgres)");
        sqlx::migrate!("./migrations/postgres").run(&self.pool).await?;
        info!("Registry migrations completed successfully");
        Ok(())
    }
}

#[async_trait]
impl VideoStore for PostgresStore {
    async fn insert(&self, record: &VideoRecord) -> StoreResult<()> {
        // ON CONFLICT DO NOTHING keeps the check and the write in one statement;
        // zero rows affected means another writer owns this id.
        let result = sqlx::query(
            r#"
            INSERT INTO videos (payload_id, resource_ref, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (payload_id) DO NOTHING
            "#,
        )
        .bind(record.payload_id.get())
        .bind(&record.resource_ref)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::DuplicateKey(record.payload_id));
        }
        Ok(())
    }

    async fn lookup(&self, payload_id: PayloadId) -> StoreResult<Option<String>> {
        let resource_ref = sqlx::query_scalar::<_, String>(
            "SELECT resource_ref FROM videos WHERE payload_id = $1",
        )
        .bind(payload_id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(resource_ref)
    }

    async fn exists(&self, payload_id: PayloadId) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM videos WHERE payload_id = $1)",
        )
        .bind(payload_id.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

#[async_trait]
impl AccessLog for PostgresStore {
    async fn append(&self, entry: &NewAccessLogEntry) -> StoreResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO access_logs (requester_id, payload_id, accessed_at)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(entry.requester_id)
        .bind(entry.payload_id.get())
        .bind(entry.accessed_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }
}
