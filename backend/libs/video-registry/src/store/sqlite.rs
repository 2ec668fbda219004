//! SQLite adapter for local development and tests

use super::{AccessLog, VideoStore};
use crate::error::{StoreError, StoreResult};
use crate::models::{NewAccessLogEntry, PayloadId, VideoRecord};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Private in-memory database on a single pinned connection.
    ///
    /// Every SQLite `:memory:` connection is its own database, so the pool
    /// must never open a second one or recycle the first.
    pub async fn in_memory() -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Open (creating if missing) a database file with the caller's pool settings
    pub async fn open(url: &str, pool_options: SqlitePoolOptions) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = pool_options.connect_with(options).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Apply the embedded `migrations/sqlite` schema
    pub async fn migrate(&self) -> StoreResult<()> {
        debug!("Running registry migrations (sqlite)");
        sqlx::migrate!("./migrations/sqlite").run(&self.pool).await?;
        info!("Registry migrations completed successfully");
        Ok(())
    }
}

#[async_trait]
impl VideoStore for SqliteStore {
    async fn insert(&self, record: &VideoRecord) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO videos (payload_id, resource_ref, created_at)
            VALUES (?1, ?2, ?3)
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
            "SELECT resource_ref FROM videos WHERE payload_id = ?1",
        )
        .bind(payload_id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(resource_ref)
    }

    async fn exists(&self, payload_id: PayloadId) -> StoreResult<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM videos WHERE payload_id = ?1")
            .bind(payload_id.get())
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }
}

#[async_trait]
impl AccessLog for SqliteStore {
    async fn append(&self, entry: &NewAccessLogEntry) -> StoreResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO access_logs (requester_id, payload_id, accessed_at)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(entry.requester_id)
        .bind(entry.payload_id.get())
        .bind(entry.accessed_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }
}
