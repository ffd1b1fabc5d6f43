//! Note repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Error, Result};
use crate::models::{Attachment, AttachmentId, Note, NoteId, DEFAULT_MIME_TYPE};
use crate::util::unix_millis_now;

/// How long tombstones stay in the trash before `empty_trash` may erase them
pub const TRASH_RETENTION: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Trait for note storage operations
pub trait NoteRepository {
    /// Create a new note referencing already stored attachments
    fn create(&self, content: &str, asset_ids: Vec<AttachmentId>) -> Result<Note>;

    /// Get a note by ID, tombstones included
    fn get(&self, id: &NoteId) -> Result<Option<Note>>;

    /// List live notes, newest first
    fn list(&self, limit: usize, offset: usize) -> Result<Vec<Note>>;

    /// Update a live note's content
    fn update(&self, id: &NoteId, content: &str) -> Result<Note>;

    /// Move a note to the trash
    fn soft_delete(&self, id: &NoteId) -> Result<Note>;

    /// Bring a note back from the trash
    fn restore(&self, id: &NoteId) -> Result<Note>;

    /// Tombstoned notes, most recently deleted first
    fn list_trash(&self) -> Result<Vec<Note>>;

    /// Erase tombstones deleted at or before `deleted_before` (Unix ms).
    ///
    /// Their attachments are removed locally and queued for remote deletion.
    /// Remote shards keep the tombstones, so a later sync brings an erased
    /// note back into the trash. It never returns as a live note.
    /// Returns the number of erased notes.
    fn empty_trash(&self, deleted_before: i64) -> Result<usize>;

    /// Store an attachment payload
    fn add_attachment(&self, bytes: Vec<u8>, mime_type: &str) -> Result<Attachment>;

    /// Reference an attachment from a live note
    fn link_attachment(&self, id: &NoteId, attachment_id: &AttachmentId) -> Result<Note>;
}

/// Cutoff for [`NoteRepository::empty_trash`] honouring [`TRASH_RETENTION`].
#[must_use]
pub fn trash_cutoff(now: i64) -> i64 {
    now.saturating_sub(i64::try_from(TRASH_RETENTION.as_millis()).unwrap_or(i64::MAX))
}

/// `SQLite` implementation of `NoteRepository`
pub struct SqliteNoteRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteNoteRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse payload rows into notes
    fn parse_notes(payloads: Vec<String>) -> Result<Vec<Note>> {
        payloads
            .iter()
            .map(|payload| serde_json::from_str(payload).map_err(Error::from))
            .collect()
    }

    fn query_notes(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Note>> {
        let mut stmt = self.conn.prepare(sql)?;
        let payloads = stmt
            .query_map(params, |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Self::parse_notes(payloads)
    }

    fn get_live(&self, id: &NoteId) -> Result<Note> {
        match self.get(id)? {
            Some(note) if !note.is_deleted => Ok(note),
            _ => Err(Error::NotFound(id.to_string())),
        }
    }

    /// Every note, tombstones included
    pub fn list_all(&self) -> Result<Vec<Note>> {
        self.query_notes("SELECT payload FROM notes ORDER BY timestamp DESC", [])
    }

    /// Insert or replace a note by id
    pub fn upsert(&self, note: &Note) -> Result<()> {
        self.conn.execute(
            "INSERT INTO notes (id, timestamp, updated_at, is_deleted, deleted_at, payload)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
               timestamp = excluded.timestamp,
               updated_at = excluded.updated_at,
               is_deleted = excluded.is_deleted,
               deleted_at = excluded.deleted_at,
               payload = excluded.payload",
            params![
                note.id.as_str(),
                note.timestamp,
                note.updated_at,
                i32::from(note.is_deleted),
                note.deleted_at,
                serde_json::to_string(note)?,
            ],
        )?;
        Ok(())
    }

    pub fn asset_exists(&self, id: &AttachmentId) -> Result<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM assets WHERE id = ?1)",
            params![id.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    pub fn get_attachment(&self, id: &AttachmentId) -> Result<Option<Attachment>> {
        let attachment = self
            .conn
            .query_row(
                "SELECT mime_type, data, created_at FROM assets WHERE id = ?1",
                params![id.as_str()],
                |row| {
                    Ok(Attachment {
                        id: id.clone(),
                        mime_type: row.get(0)?,
                        bytes: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(attachment)
    }

    /// Store or replace attachment bytes; an existing mime type is kept
    pub fn write_asset(&self, id: &AttachmentId, bytes: &[u8]) -> Result<()> {
        self.conn.execute(
            "INSERT INTO assets (id, mime_type, data, created_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET data = excluded.data",
            params![id.as_str(), DEFAULT_MIME_TYPE, bytes, unix_millis_now()],
        )?;
        Ok(())
    }

    pub fn is_asset_synced(&self, id: &AttachmentId) -> Result<bool> {
        let synced = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM synced_assets WHERE asset_id = ?1)",
            params![id.as_str()],
            |row| row.get(0),
        )?;
        Ok(synced)
    }

    pub fn mark_asset_synced(&self, id: &AttachmentId) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO synced_assets (asset_id, synced_at) VALUES (?1, ?2)",
            params![id.as_str(), unix_millis_now()],
        )?;
        Ok(())
    }

    pub fn enqueue_deletion(&self, id: &AttachmentId) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO deletion_queue (asset_id, queued_at) VALUES (?1, ?2)",
            params![id.as_str(), unix_millis_now()],
        )?;
        Ok(())
    }

    /// Pending remote deletions, oldest first
    pub fn deletion_queue(&self) -> Result<Vec<AttachmentId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT asset_id FROM deletion_queue ORDER BY queued_at, asset_id")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids.iter().map(|id| AttachmentId::from(id.as_str())).collect())
    }

    pub fn remove_from_deletion_queue(&self, id: &AttachmentId) -> Result<()> {
        self.conn.execute(
            "DELETE FROM deletion_queue WHERE asset_id = ?1",
            params![id.as_str()],
        )?;
        Ok(())
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create(&self, content: &str, asset_ids: Vec<AttachmentId>) -> Result<Note> {
        if content.trim().is_empty() && asset_ids.is_empty() {
            return Err(Error::InvalidInput(
                "Note content cannot be empty".to_string(),
            ));
        }

        let note = Note::new(content).with_asset_ids(asset_ids);
        self.upsert(&note)?;
        Ok(note)
    }

    fn get(&self, id: &NoteId) -> Result<Option<Note>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM notes WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        payload
            .map(|payload| serde_json::from_str(&payload).map_err(Error::from))
            .transpose()
    }

    fn list(&self, limit: usize, offset: usize) -> Result<Vec<Note>> {
        self.query_notes(
            "SELECT payload FROM notes
             WHERE is_deleted = 0
             ORDER BY timestamp DESC
             LIMIT ?1 OFFSET ?2",
            params![limit as i64, offset as i64],
        )
    }

    fn update(&self, id: &NoteId, content: &str) -> Result<Note> {
        let mut note = self.get_live(id)?;
        note.edit(content, unix_millis_now());
        self.upsert(&note)?;
        Ok(note)
    }

    fn soft_delete(&self, id: &NoteId) -> Result<Note> {
        let mut note = self.get_live(id)?;
        note.mark_deleted(unix_millis_now());
        self.upsert(&note)?;
        Ok(note)
    }

    fn restore(&self, id: &NoteId) -> Result<Note> {
        let mut note = self
            .get(id)?
            .filter(|note| note.is_deleted)
            .ok_or_else(|| Error::NotFound(format!("{id} is not in the trash")))?;
        note.restore(unix_millis_now());
        self.upsert(&note)?;
        Ok(note)
    }

    fn list_trash(&self) -> Result<Vec<Note>> {
        self.query_notes(
            "SELECT payload FROM notes WHERE is_deleted = 1 ORDER BY deleted_at DESC",
            [],
        )
    }

    fn empty_trash(&self, deleted_before: i64) -> Result<usize> {
        let expired = self.query_notes(
            "SELECT payload FROM notes
             WHERE is_deleted = 1 AND COALESCE(deleted_at, 0) <= ?1",
            params![deleted_before],
        )?;
        if expired.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.unchecked_transaction()?;
        for note in &expired {
            for asset_id in &note.asset_ids {
                tx.execute("DELETE FROM assets WHERE id = ?1", params![asset_id.as_str()])?;
                tx.execute(
                    "DELETE FROM synced_assets WHERE asset_id = ?1",
                    params![asset_id.as_str()],
                )?;
                tx.execute(
                    "INSERT OR IGNORE INTO deletion_queue (asset_id, queued_at) VALUES (?1, ?2)",
                    params![asset_id.as_str(), unix_millis_now()],
                )?;
            }
            tx.execute("DELETE FROM notes WHERE id = ?1", params![note.id.as_str()])?;
        }
        tx.commit()?;

        tracing::info!("Erased {} notes from the trash", expired.len());
        Ok(expired.len())
    }

    fn add_attachment(&self, bytes: Vec<u8>, mime_type: &str) -> Result<Attachment> {
        let attachment = Attachment::new(bytes, mime_type)?;
        self.conn.execute(
            "INSERT INTO assets (id, mime_type, data, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                attachment.id.as_str(),
                attachment.mime_type,
                attachment.bytes,
                attachment.created_at
            ],
        )?;
        Ok(attachment)
    }

    fn link_attachment(&self, id: &NoteId, attachment_id: &AttachmentId) -> Result<Note> {
        if !self.asset_exists(attachment_id)? {
            return Err(Error::NotFound(format!("attachment {attachment_id}")));
        }

        let mut note = self.get_live(id)?;
        if !note.asset_ids.contains(attachment_id) {
            note.asset_ids.push(attachment_id.clone());
            note.updated_at = Some(unix_millis_now());
            self.upsert(&note)?;
        }
        Ok(note)
    }
}
