//! Attachment reconciliation between the local store and the remote.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::layout::RemoteLayout;
use crate::models::{AttachmentId, Note};
use crate::remote::{RemoteError, RemoteTransport};
use crate::store::LocalStore;
use crate::Result;

/// Transfer counts for one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetOutcome {
    pub downloaded: usize,
    pub uploaded: usize,
    pub failed: usize,
}

impl AssetOutcome {
    fn absorb(&mut self, other: Self) {
        self.downloaded += other.downloaded;
        self.uploaded += other.uploaded;
        self.failed += other.failed;
    }
}

/// Makes every attachment referenced by a live note exist on both sides.
pub struct AssetReconciler<'a, S: ?Sized, R: ?Sized> {
    store: &'a S,
    remote: &'a R,
    layout: &'a RemoteLayout,
}

impl<'a, S, R> AssetReconciler<'a, S, R>
where
    S: LocalStore + ?Sized,
    R: RemoteTransport + ?Sized,
{
    pub const fn new(store: &'a S, remote: &'a R, layout: &'a RemoteLayout) -> Self {
        Self {
            store,
            remote,
            layout,
        }
    }

    /// Reconcile the attachments of `notes`.
    ///
    /// A failed transfer is logged and counted; the attachment stays unsynced
    /// and is retried next run. Local store failures and rejected credentials
    /// are returned.
    pub async fn reconcile(&self, notes: &[Note]) -> Result<AssetOutcome> {
        let mut outcome = AssetOutcome::default();
        let mut seen = HashSet::new();

        let ids = notes
            .iter()
            .filter(|note| !note.is_deleted)
            .flat_map(|note| note.asset_ids.iter());

        for id in ids {
            if !seen.insert(id) {
                continue;
            }
            if !id.is_path_safe() {
                warn!(%id, "Skipping attachment with unsafe id");
                continue;
            }
            outcome.absorb(self.reconcile_one(id).await?);
        }

        Ok(outcome)
    }

    async fn reconcile_one(&self, id: &AttachmentId) -> Result<AssetOutcome> {
        let mut outcome = AssetOutcome::default();
        let path = self.layout.asset_path(id);

        if !self.store.asset_exists(id).await? {
            match self.remote.get_binary(&path).await {
                Ok(bytes) => {
                    self.store.write_asset(id, bytes).await?;
                    self.store.mark_asset_synced(id).await?;
                    debug!(%id, "Downloaded attachment");
                    outcome.downloaded += 1;
                }
                Err(error) => Self::tolerate(id, "download", error, &mut outcome)?,
            }
        } else if !self.store.is_asset_synced(id).await? {
            let bytes = self.store.read_asset(id).await?;
            match self.remote.put_binary(&path, &bytes).await {
                Ok(()) => {
                    self.store.mark_asset_synced(id).await?;
                    debug!(%id, size = bytes.len(), "Uploaded attachment");
                    outcome.uploaded += 1;
                }
                Err(error) => Self::tolerate(id, "upload", error, &mut outcome)?,
            }
        }

        Ok(outcome)
    }

    fn tolerate(
        id: &AttachmentId,
        direction: &str,
        error: RemoteError,
        outcome: &mut AssetOutcome,
    ) -> Result<()> {
        if error.is_authentication() {
            return Err(error.into());
        }
        warn!(%id, direction, %error, "Attachment transfer failed; will retry next sync");
        outcome.failed += 1;
        Ok(())
    }
}
