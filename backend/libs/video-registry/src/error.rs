//! Error types for the video registry library

use crate::models::PayloadId;
use thiserror::Error;

/// Result type for storage adapter operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised by a storage adapter
#[derive(Error, Debug)]
pub enum StoreError {
    /// A record with this payload id already exists.
    ///
    /// Expected under concurrent registration; the registry retries with a
    /// fresh candidate and never surfaces this to its caller.
    #[error("Duplicate payload id: {0}")]
    DuplicateKey(PayloadId),

    /// Database operation failed (connection, query execution, etc.)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Check if error is transient (the caller may retry the whole call)
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Database(sqlx_err) => matches!(
                sqlx_err,
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            ),
            _ => false,
        }
    }
}

/// Errors surfaced to the transport layer
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Every allocation attempt collided or was rejected by the store
    #[error("Payload id allocation exhausted after {attempts} attempts")]
    AllocationExhausted { attempts: u32 },

    /// The resource reference cannot be stored (empty)
    #[error("Invalid resource reference: {0}")]
    InvalidResourceRef(String),

    /// Storage round trip failed
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl RegistryError {
    /// Check if error is transient (should retry)
    pub fn is_transient(&self) -> bool {
        match self {
            RegistryError::Storage(e) => e.is_transient(),
            _ => false,
        }
    }
}
