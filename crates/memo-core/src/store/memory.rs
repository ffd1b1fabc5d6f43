//! In-memory [`LocalStore`].

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::LocalStore;
use crate::models::{AttachmentId, Note, NoteId};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct State {
    notes: BTreeMap<NoteId, Note>,
    assets: HashMap<AttachmentId, Vec<u8>>,
    synced: HashSet<AttachmentId>,
    deletion_queue: Vec<AttachmentId>,
}

/// Volatile store for tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with notes.
    #[must_use]
    pub fn with_notes(notes: impl IntoIterator<Item = Note>) -> Self {
        let state = State {
            notes: notes
                .into_iter()
                .map(|note| (note.id.clone(), note))
                .collect(),
            ..State::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    /// Store a local attachment that has not been uploaded yet.
    pub async fn insert_asset(&self, id: AttachmentId, bytes: Vec<u8>) {
        let mut state = self.state.lock().await;
        state.synced.remove(&id);
        state.assets.insert(id, bytes);
    }

    /// Drop a local attachment, as a hard delete would.
    pub async fn remove_asset(&self, id: &AttachmentId) {
        let mut state = self.state.lock().await;
        state.assets.remove(id);
        state.synced.remove(id);
    }

    pub async fn note(&self, id: &NoteId) -> Option<Note> {
        self.state.lock().await.notes.get(id).cloned()
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn list_notes(&self) -> Result<Vec<Note>> {
        Ok(self.state.lock().await.notes.values().cloned().collect())
    }

    async fn upsert_note(&self, note: &Note) -> Result<()> {
        self.state
            .lock()
            .await
            .notes
            .insert(note.id.clone(), note.clone());
        Ok(())
    }

    async fn asset_exists(&self, id: &AttachmentId) -> Result<bool> {
        Ok(self.state.lock().await.assets.contains_key(id))
    }

    async fn read_asset(&self, id: &AttachmentId) -> Result<Vec<u8>> {
        self.state
            .lock()
            .await
            .assets
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("attachment {id}")))
    }

    async fn write_asset(&self, id: &AttachmentId, bytes: Vec<u8>) -> Result<()> {
        self.state.lock().await.assets.insert(id.clone(), bytes);
        Ok(())
    }

    async fn is_asset_synced(&self, id: &AttachmentId) -> Result<bool> {
        Ok(self.state.lock().await.synced.contains(id))
    }

    async fn mark_asset_synced(&self, id: &AttachmentId) -> Result<()> {
        self.state.lock().await.synced.insert(id.clone());
        Ok(())
    }

    async fn enqueue_deletion(&self, id: &AttachmentId) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.deletion_queue.contains(id) {
            state.deletion_queue.push(id.clone());
        }
        Ok(())
    }

    async fn deletion_queue(&self) -> Result<Vec<AttachmentId>> {
        Ok(self.state.lock().await.deletion_queue.clone())
    }

    async fn remove_from_deletion_queue(&self, id: &AttachmentId) -> Result<()> {
        self.state
            .lock()
            .await
            .deletion_queue
            .retain(|queued| queued != id);
        Ok(())
    }
}
