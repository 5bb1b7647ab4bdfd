//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Entry encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] nodegraph_core::CoreError),

    /// An append skipped ahead of the log head.
    #[error("out of order append: expected seq {expected}, got {got}")]
    OutOfOrder { expected: u64, got: u64 },

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock was poisoned by a panicking holder.
    #[error("store lock poisoned")]
    Poisoned,

    /// A blocking task failed to complete.
    #[error("blocking task failed: {0}")]
    Task(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
