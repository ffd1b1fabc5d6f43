//! Local persistence seen by the sync engine.

mod memory;

use async_trait::async_trait;

use crate::models::{AttachmentId, Note};
use crate::Result;

pub use memory::MemoryStore;

/// On-device store consumed by [`SyncEngine`](crate::sync::SyncEngine).
///
/// Implementations must be safe to share between tasks; the engine never holds
/// a borrow across calls.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Every note, including tombstones.
    async fn list_notes(&self) -> Result<Vec<Note>>;

    /// Insert or replace a note by id.
    async fn upsert_note(&self, note: &Note) -> Result<()>;

    async fn asset_exists(&self, id: &AttachmentId) -> Result<bool>;

    /// Attachment bytes; [`Error::NotFound`](crate::Error::NotFound) when absent.
    async fn read_asset(&self, id: &AttachmentId) -> Result<Vec<u8>>;

    /// Store attachment bytes received from the remote.
    async fn write_asset(&self, id: &AttachmentId, bytes: Vec<u8>) -> Result<()>;

    /// Whether the remote copy is known to exist.
    async fn is_asset_synced(&self, id: &AttachmentId) -> Result<bool>;

    async fn mark_asset_synced(&self, id: &AttachmentId) -> Result<()>;

    /// Record that the remote copy of an attachment must be deleted.
    async fn enqueue_deletion(&self, id: &AttachmentId) -> Result<()>;

    /// Pending remote deletions, oldest first.
    async fn deletion_queue(&self) -> Result<Vec<AttachmentId>>;

    async fn remove_from_deletion_queue(&self, id: &AttachmentId) -> Result<()>;
}
