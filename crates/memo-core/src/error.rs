//! Error types for memo-core

use thiserror::Error;

use crate::remote::RemoteError;

/// Result type alias using memo-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in memo-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Note not found
    #[error("Note not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote (WebDAV) error
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A sync run was requested while another one is still running
    #[error("A sync run is already in progress")]
    SyncInProgress,
}

impl Error {
    /// Whether the remote rejected the configured credentials.
    ///
    /// Callers should prompt for re-configuration instead of retrying.
    pub const fn is_authentication(&self) -> bool {
        matches!(self, Self::Remote(RemoteError::Authentication { .. }))
    }
}
