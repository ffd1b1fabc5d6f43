//! Note model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::attachment::AttachmentId;
use crate::error::Error;
use crate::shard::shard_key;

/// A unique identifier for a note.
///
/// Ids are opaque strings on the wire; locally created notes use UUID v7.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Create a new unique note ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NoteId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidInput("Note id cannot be empty".to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A note as stored locally and inside remote shard files.
///
/// Serialized as camelCase JSON. Fields this crate does not interpret are kept
/// in [`Note::extra`] so a sync round-trip never drops data written by other
/// clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier
    pub id: NoteId,
    /// Markdown content
    #[serde(default)]
    pub content: String,
    /// Creation instant (Unix ms); decides the shard and never changes
    pub timestamp: i64,
    /// Human-readable creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last mutation instant (Unix ms), used for conflict resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    /// Tombstone flag
    #[serde(default)]
    pub is_deleted: bool,
    /// When the tombstone was set (Unix ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
    /// Referenced attachments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub asset_ids: Vec<AttachmentId>,
    /// Fields owned by other parts of the application
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Note {
    /// Create a new note with the given content
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        let now = chrono::Utc::now();
        let millis = now.timestamp_millis();
        Self {
            id: NoteId::new(),
            content: content.into(),
            timestamp: millis,
            created_at: Some(now.to_rfc3339()),
            updated_at: Some(millis),
            is_deleted: false,
            deleted_at: None,
            asset_ids: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Attach existing attachment ids to a freshly built note
    #[must_use]
    pub fn with_asset_ids(mut self, asset_ids: Vec<AttachmentId>) -> Self {
        self.asset_ids = asset_ids;
        self
    }

    /// `updatedAt`, treating a missing value as 0
    #[must_use]
    pub fn updated_at_or_zero(&self) -> i64 {
        self.updated_at.unwrap_or(0)
    }

    /// Week shard this note belongs to
    #[must_use]
    pub fn shard_key(&self) -> String {
        shard_key(self.timestamp)
    }

    /// Replace content and bump `updatedAt`
    pub fn edit(&mut self, content: impl Into<String>, now: i64) {
        self.content = content.into();
        self.updated_at = Some(now);
    }

    /// Turn the note into a tombstone
    pub fn mark_deleted(&mut self, now: i64) {
        self.is_deleted = true;
        self.deleted_at = Some(now);
        self.updated_at = Some(now);
    }

    /// Clear the tombstone
    pub fn restore(&mut self, now: i64) {
        self.is_deleted = false;
        self.deleted_at = None;
        self.updated_at = Some(now);
    }
}
