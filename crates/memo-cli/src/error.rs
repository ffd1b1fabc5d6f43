use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] memo_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No note content provided")]
    EmptyContent,
    #[error("Edited note content cannot be empty")]
    EmptyEditedContent,
    #[error("Note ID cannot be empty")]
    EmptyNoteId,
    #[error("Note not found for id/prefix: {0}")]
    NoteNotFound(String),
    #[error("{0}")]
    AmbiguousNoteId(String),
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("Could not resolve a data directory; pass --db-path or set MEMO_DB_PATH")]
    NoDataDir,
    #[error(
        "Sync is not configured. Set MEMO_WEBDAV_URL, MEMO_WEBDAV_USERNAME and MEMO_WEBDAV_PASSWORD (a .env file works too)."
    )]
    SyncNotConfigured,
}

impl From<memo_core::RemoteError> for CliError {
    fn from(error: memo_core::RemoteError) -> Self {
        Self::Core(error.into())
    }
}
