//! Deletion queue: remote attachment copies waiting to be removed.

use tracing::{debug, warn};

use super::layout::RemoteLayout;
use crate::models::AttachmentId;
use crate::remote::RemoteTransport;
use crate::store::LocalStore;
use crate::Result;

/// Result of one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainOutcome {
    pub deleted: usize,
    pub failed: usize,
}

/// Durable queue backed by the [`LocalStore`].
pub struct DeletionQueue<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: LocalStore + ?Sized> DeletionQueue<'a, S> {
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn enqueue(&self, id: &AttachmentId) -> Result<()> {
        self.store.enqueue_deletion(id).await
    }

    pub async fn list(&self) -> Result<Vec<AttachmentId>> {
        self.store.deletion_queue().await
    }

    pub async fn remove(&self, id: &AttachmentId) -> Result<()> {
        self.store.remove_from_deletion_queue(id).await
    }

    /// Delete every queued attachment from the remote.
    ///
    /// Successful deletes leave the queue; failed ones stay for the next run.
    /// Rejected credentials abort the drain.
    pub async fn drain<R: RemoteTransport + ?Sized>(
        &self,
        remote: &R,
        layout: &RemoteLayout,
    ) -> Result<DrainOutcome> {
        let mut outcome = DrainOutcome::default();

        for id in self.list().await? {
            if !id.is_path_safe() {
                warn!(%id, "Dropping unsafe attachment id from deletion queue");
                self.remove(&id).await?;
                continue;
            }

            match remote.delete(&layout.asset_path(&id)).await {
                Ok(()) => {
                    debug!(%id, "Deleted remote attachment");
                    self.remove(&id).await?;
                    outcome.deleted += 1;
                }
                Err(error) if error.is_authentication() => return Err(error.into()),
                Err(error) => {
                    warn!(%id, %error, "Remote attachment delete failed; keeping it queued");
                    outcome.failed += 1;
                }
            }
        }

        Ok(outcome)
    }
}
