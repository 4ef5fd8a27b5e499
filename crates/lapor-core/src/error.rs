//! Error types for lapor-core

use thiserror::Error;

/// Result type alias using lapor-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lapor-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Report not found
    #[error("Report not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Actor is not allowed to perform the mutation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A full sync is already running on this device
    #[error("A sync is already in progress")]
    SyncInProgress,
}
