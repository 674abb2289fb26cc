//! Error types for the Merkle tree synchronization engine.

use crate::types::Version;
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Corrupt record in {collection}: {reason}")]
    Corrupt {
        collection: &'static str,
        reason: String,
    },

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

/// Errors surfaced by the synchronization service and its components.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Merkle tree for database '{0}' is already created")]
    AlreadyExists(String),

    #[error("Merkle tree for database '{0}' is not created")]
    NotCreated(String),

    #[error("Merkle tree with the root {0} does not exist")]
    RootNotFound(String),

    #[error("Leaf index {index} is out of range (capacity {capacity})")]
    IndexOutOfRange { index: u64, capacity: u64 },

    #[error("Node level {level} is out of range for height {height}")]
    LevelOutOfRange { level: u32, height: u32 },

    #[error("Invalid tree height {0} (must be 1..=64)")]
    InvalidHeight(u32),

    #[error("Root ledger monotonicity violated: latest version {latest}, attempted {attempted}")]
    MonotonicityViolation { latest: Version, attempted: Version },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl SyncError {
    /// Whether the caller may safely retry the failed operation as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Storage(_))
    }
}

impl From<sled::Error> for SyncError {
    fn from(err: sled::Error) -> Self {
        SyncError::Storage(err.into())
    }
}

impl From<config::ConfigError> for SyncError {
    fn from(err: config::ConfigError) -> Self {
        SyncError::ConfigError(err.to_string())
    }
}

impl From<sled::transaction::TransactionError<SyncError>> for SyncError {
    fn from(err: sled::transaction::TransactionError<SyncError>) -> Self {
        match err {
            sled::transaction::TransactionError::Abort(inner) => inner,
            sled::transaction::TransactionError::Storage(e) => e.into(),
        }
    }
}
