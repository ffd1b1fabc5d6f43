//! Shared database service wrapper used across clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::db::{Database, NoteRepository, SqliteNoteRepository};
use crate::models::{Attachment, AttachmentId, Note};
use crate::store::LocalStore;
use crate::{Error, NoteId, Result};

/// Thread-safe service for DB and repository operations.
///
/// Also the production [`LocalStore`] for the sync engine.
#[derive(Clone)]
pub struct DatabaseService {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl DatabaseService {
    /// Open a database service at the given filesystem path.
    pub fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let db = Database::open(&db_path)?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory database service (primarily for tests).
    pub fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// Path of the backing file, if any.
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Run `f` against a repository while holding the connection lock.
    async fn with_repo<T>(
        &self,
        f: impl FnOnce(&SqliteNoteRepository<'_>) -> Result<T>,
    ) -> Result<T> {
        let db = self.db.lock().await;
        let repo = SqliteNoteRepository::new(db.connection());
        f(&repo)
    }

    /// List live notes newest-first.
    pub async fn list_notes(&self, limit: usize, offset: usize) -> Result<Vec<Note>> {
        self.with_repo(|repo| repo.list(limit, offset)).await
    }

    /// Fetch a note by id.
    pub async fn get_note(&self, id: &NoteId) -> Result<Option<Note>> {
        self.with_repo(|repo| repo.get(id)).await
    }

    /// Create a new note.
    pub async fn create_note(&self, content: &str, asset_ids: Vec<AttachmentId>) -> Result<Note> {
        self.with_repo(|repo| repo.create(content, asset_ids)).await
    }

    /// Update a note.
    pub async fn update_note(&self, id: &NoteId, content: &str) -> Result<Note> {
        self.with_repo(|repo| repo.update(id, content)).await
    }

    /// Soft-delete a note.
    pub async fn delete_note(&self, id: &NoteId) -> Result<Note> {
        self.with_repo(|repo| repo.soft_delete(id)).await
    }

    /// Restore a soft-deleted note.
    pub async fn restore_note(&self, id: &NoteId) -> Result<Note> {
        self.with_repo(|repo| repo.restore(id)).await
    }

    /// List notes in the trash.
    pub async fn list_trash(&self) -> Result<Vec<Note>> {
        self.with_repo(|repo| repo.list_trash()).await
    }

    /// Erase trashed notes deleted at or before the cutoff.
    pub async fn empty_trash(&self, deleted_before: i64) -> Result<usize> {
        self.with_repo(|repo| repo.empty_trash(deleted_before)).await
    }

    /// Store an attachment and, when `note_id` is given, link it to that note.
    pub async fn add_attachment(
        &self,
        bytes: Vec<u8>,
        mime_type: &str,
        note_id: Option<&NoteId>,
    ) -> Result<(Attachment, Option<Note>)> {
        self.with_repo(|repo| {
            if let Some(id) = note_id {
                if repo.get(id)?.filter(|note| !note.is_deleted).is_none() {
                    return Err(Error::NotFound(id.to_string()));
                }
            }
            let attachment = repo.add_attachment(bytes, mime_type)?;
            let note = note_id
                .map(|id| repo.link_attachment(id, &attachment.id))
                .transpose()?;
            Ok((attachment, note))
        })
        .await
    }
}

#[async_trait]
impl LocalStore for DatabaseService {
    async fn list_notes(&self) -> Result<Vec<Note>> {
        self.with_repo(|repo| repo.list_all()).await
    }

    async fn upsert_note(&self, note: &Note) -> Result<()> {
        self.with_repo(|repo| repo.upsert(note)).await
    }

    async fn asset_exists(&self, id: &AttachmentId) -> Result<bool> {
        self.with_repo(|repo| repo.asset_exists(id)).await
    }

    async fn read_asset(&self, id: &AttachmentId) -> Result<Vec<u8>> {
        self.with_repo(|repo| repo.get_attachment(id))
            .await?
            .map(|attachment| attachment.bytes)
            .ok_or_else(|| Error::NotFound(format!("attachment {id}")))
    }

    async fn write_asset(&self, id: &AttachmentId, bytes: Vec<u8>) -> Result<()> {
        self.with_repo(|repo| repo.write_asset(id, &bytes)).await
    }

    async fn is_asset_synced(&self, id: &AttachmentId) -> Result<bool> {
        self.with_repo(|repo| repo.is_asset_synced(id)).await
    }

    async fn mark_asset_synced(&self, id: &AttachmentId) -> Result<()> {
        self.with_repo(|repo| repo.mark_asset_synced(id)).await
    }

    async fn enqueue_deletion(&self, id: &AttachmentId) -> Result<()> {
        self.with_repo(|repo| repo.enqueue_deletion(id)).await
    }

    async fn deletion_queue(&self) -> Result<Vec<AttachmentId>> {
        self.with_repo(|repo| repo.deletion_queue()).await
    }

    async fn remove_from_deletion_queue(&self, id: &AttachmentId) -> Result<()> {
        self.with_repo(|repo| repo.remove_from_deletion_queue(id)).await
    }
}
