//! Storage seam for the registry
//!
//! Two narrow contracts, one canonical schema:
//!
//! - [`VideoStore`]: write-once `videos` table keyed by payload id
//! - [`AccessLog`]: append-only `access_logs` table
//!
//! Adapters differ only in which physical database backs them. Uniqueness of
//! payload ids is enforced by the adapter's atomic insert path
//! (`INSERT ... ON CONFLICT DO NOTHING` for SQL backends, the map entry API
//! for the in-memory backend), never by a separate pre-check.

use crate::error::StoreResult;
use crate::models::{NewAccessLogEntry, PayloadId, VideoRecord};
use async_trait::async_trait;

pub mod memory;
pub mod postgres;
pub mod sqlite;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;

/// Durable mapping from payload id to resource reference
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Insert a record once.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateKey` if the payload id is already present;
    /// the existing record is left untouched.
    async fn insert(&self, record: &VideoRecord) -> StoreResult<()>;

    /// Point lookup, no side effects. `Ok(None)` when the id is unknown.
    async fn lookup(&self, payload_id: PayloadId) -> StoreResult<Option<String>>;

    /// Existence probe used by the allocator.
    async fn exists(&self, payload_id: PayloadId) -> StoreResult<bool> {
        Ok(self.lookup(payload_id).await?.is_some())
    }
}

/// Append-only audit trail of successful lookups
#[async_trait]
pub trait AccessLog: Send + Sync {
    /// Append one entry, returning its log sequence id.
    async fn append(&self, entry: &NewAccessLogEntry) -> StoreResult<i64>;
}
