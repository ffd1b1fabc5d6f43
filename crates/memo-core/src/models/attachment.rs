//! Attachment model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Fallback media type for payloads whose type is unknown.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// A unique identifier for an attachment.
///
/// Generated at creation and independent of the payload. It doubles as the
/// remote object name, so it must stay a single path segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentId(String);

impl AttachmentId {
    /// Create a new unique attachment ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation of this ID.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id can be used verbatim as a remote object name.
    #[must_use]
    pub fn is_path_safe(&self) -> bool {
        let id = self.0.as_str();
        !id.is_empty()
            && id != "."
            && id != ".."
            && !id.contains(['/', '\\'])
            && !id.chars().any(char::is_control)
    }
}

impl Default for AttachmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AttachmentId {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let id = Self(s.trim().to_string());
        if !id.is_path_safe() {
            return Err(Error::InvalidInput(format!("Invalid attachment id: {s:?}")));
        }
        Ok(id)
    }
}

impl From<&str> for AttachmentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Binary attachment stored next to the notes that reference it.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Unique attachment identifier.
    pub id: AttachmentId,
    /// Content MIME type.
    pub mime_type: String,
    /// Raw payload.
    pub bytes: Vec<u8>,
    /// Creation timestamp (Unix ms).
    pub created_at: i64,
}

impl Attachment {
    /// Create a new attachment with a fresh id.
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Result<Self> {
        Self::with_id(AttachmentId::new(), bytes, mime_type)
    }

    /// Build an attachment for a known id (e.g. one downloaded during sync).
    pub fn with_id(
        id: AttachmentId,
        bytes: Vec<u8>,
        mime_type: impl Into<String>,
    ) -> Result<Self> {
        if !id.is_path_safe() {
            return Err(Error::InvalidInput(format!("Invalid attachment id: {id}")));
        }

        let mime_type = mime_type.into().trim().to_string();
        if mime_type.is_empty() {
            return Err(Error::InvalidInput(
                "Attachment mime_type cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            id,
            mime_type,
            bytes,
            created_at: chrono::Utc::now().timestamp_millis(),
        })
    }

    /// Payload size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("id", &self.id)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .field("created_at", &self.created_at)
            .finish()
    }
}
