//! Backend selection and connection setup

use crate::allocator::{IdAllocator, UniformDigits};
use crate::config::{Backend, RegistryConfig};
use crate::error::StoreResult;
use crate::registry::Registry;
use crate::store::{MemoryStore, PostgresStore, SqliteStore};
use sqlx::pool::PoolOptions;
use sqlx::{Database, Postgres};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Build a [`Registry`] on the configured backend.
///
/// SQL backends are verified with a `SELECT 1` under the connect timeout and
/// migrated before the registry is handed out.
pub async fn connect(config: &RegistryConfig) -> StoreResult<Registry> {
    debug!(
        backend = config.backend.as_str(),
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        acquire_timeout_secs = config.acquire_timeout_secs,
        "Connecting video registry"
    );

    let registry = match config.backend {
        Backend::Postgres => {
            let pool = pool_options::<Postgres>(config)
                .test_before_acquire(true)
                .connect(&config.database_url)
                .await?;
            verify_connection(
                sqlx::query("SELECT 1").execute(&pool),
                config.connect_timeout_secs,
            )
            .await?;

            let store = Arc::new(PostgresStore::new(pool));
            store.migrate().await?;
            Registry::new(store.clone(), store)
        }
        Backend::Sqlite => {
            let store = SqliteStore::open(&config.database_url, pool_options(config)).await?;
            verify_connection(
                sqlx::query("SELECT 1").execute(store.pool()),
                config.connect_timeout_secs,
            )
            .await?;

            store.migrate().await?;
            let store = Arc::new(store);
            Registry::new(store.clone(), store)
        }
        Backend::Memory => {
            let store = Arc::new(MemoryStore::new());
            Registry::new(store.clone(), store)
        }
    };

    info!(backend = config.backend.as_str(), "Video registry ready");

    Ok(registry
        .with_allocator(IdAllocator::new(UniformDigits, config.max_probes))
        .with_max_attempts(config.max_attempts))
}

/// Pool sizing and acquire timeout shared by every SQL backend
pub(crate) fn pool_options<DB: Database>(config: &RegistryConfig) -> PoolOptions<DB> {
    PoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
}

async fn verify_connection<T>(
    check: impl Future<Output = Result<T, sqlx::Error>>,
    timeout_secs: u64,
) -> StoreResult<()> {
    match tokio::time::timeout(Duration::from_secs(timeout_secs), check).await {
        Ok(Ok(_)) => {
            debug!("Database connection verified");
            Ok(())
        }
        Ok(Err(e)) => {
            error!(error = %e, "Database connection verification failed");
            Err(e.into())
        }
        Err(_) => {
            error!(timeout_secs, "Database connection verification timeout");
            Err(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "Database verification timeout",
            ))
            .into())
        }
    }
}
