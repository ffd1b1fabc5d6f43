//! Sync engine: reconciles the local store with week shards on a WebDAV remote.
//!
//! A run prepares the remote folders, drains the deletion queue, then walks
//! every shard key known on either side, newest week first. Each shard is
//! fetched, merged last-writer-wins, written back locally where the remote won
//! and re-uploaded when the local side changed it. Attachments of the merged
//! notes are reconciled along the way.

mod assets;
mod deletion;
mod layout;
mod merge;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::models::{Note, NoteId};
use crate::remote::RemoteTransport;
use crate::shard::shard_key_from_file_name;
use crate::store::LocalStore;
use crate::{Error, Result};

pub use assets::{AssetOutcome, AssetReconciler};
pub use deletion::{DeletionQueue, DrainOutcome};
pub use layout::RemoteLayout;
pub use merge::{merge_shard, resolve_conflict, ShardMerge};

/// Phase reported to the caller while a run progresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncProgress {
    PreparingFolders,
    DrainingDeletions,
    ListingShards,
    /// Working on shard `index` of `total` (1-based)
    Shard {
        key: String,
        index: usize,
        total: usize,
    },
    Finished,
}

impl fmt::Display for SyncProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreparingFolders => f.write_str("Preparing remote folders"),
            Self::DrainingDeletions => f.write_str("Removing deleted attachments from remote"),
            Self::ListingShards => f.write_str("Listing remote notes"),
            Self::Shard { key, index, total } => write!(f, "Syncing {key} ({index}/{total})"),
            Self::Finished => f.write_str("Sync complete"),
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub shards_processed: usize,
    pub shards_uploaded: usize,
    /// Notes written locally because the remote copy won or was new
    pub notes_pulled: usize,
    pub assets_downloaded: usize,
    pub assets_uploaded: usize,
    /// Attachment transfers that failed and will be retried next run
    pub asset_failures: usize,
    pub deletions_completed: usize,
    pub deletions_failed: usize,
    /// Shards whose remote copy could not be read; left untouched remotely
    pub degraded_shards: Vec<String>,
}

impl SyncReport {
    /// Whether every shard and transfer went through.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.degraded_shards.is_empty() && self.asset_failures == 0 && self.deletions_failed == 0
    }

    fn add_assets(&mut self, outcome: AssetOutcome) {
        self.assets_downloaded += outcome.downloaded;
        self.assets_uploaded += outcome.uploaded;
        self.asset_failures += outcome.failed;
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} shards ({} uploaded), {} notes pulled, {} attachments downloaded, {} uploaded",
            self.shards_processed,
            self.shards_uploaded,
            self.notes_pulled,
            self.assets_downloaded,
            self.assets_uploaded
        )?;
        if self.deletions_completed > 0 {
            write!(f, ", {} remote deletions", self.deletions_completed)?;
        }
        if !self.is_clean() {
            write!(
                f,
                " ({} degraded shards, {} failed transfers, {} pending deletions)",
                self.degraded_shards.len(),
                self.asset_failures,
                self.deletions_failed
            )?;
        }
        Ok(())
    }
}

/// Clears the in-flight flag when a run ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives sync runs between a [`LocalStore`] and a [`RemoteTransport`].
pub struct SyncEngine {
    store: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteTransport>,
    layout: RemoteLayout,
    running: AtomicBool,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteTransport>,
        layout: RemoteLayout,
    ) -> Self {
        Self {
            store,
            remote,
            layout,
            running: AtomicBool::new(false),
        }
    }

    /// Whether a run is currently in flight.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one sync without progress reporting.
    pub async fn sync(&self) -> Result<SyncReport> {
        self.synchronize(|_| {}).await
    }

    /// Run one sync, reporting each phase to `on_progress`.
    ///
    /// Fails with [`Error::SyncInProgress`] while another run is active. Fatal
    /// errors (folder setup, listing, rejected credentials, shard upload, local
    /// store failures) abort the run; shards committed before stay committed.
    pub async fn synchronize<P>(&self, mut on_progress: P) -> Result<SyncReport>
    where
        P: FnMut(&SyncProgress) + Send,
    {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            return Err(Error::SyncInProgress);
        };

        info!(root = self.layout.root(), "Starting sync run");
        let mut report = SyncReport::default();

        on_progress(&SyncProgress::PreparingFolders);
        for collection in self.layout.collections() {
            self.remote.ensure_collection(&collection).await?;
        }

        on_progress(&SyncProgress::DrainingDeletions);
        let drained = DeletionQueue::new(self.store.as_ref())
            .drain(self.remote.as_ref(), &self.layout)
            .await?;
        report.deletions_completed = drained.deleted;
        report.deletions_failed = drained.failed;

        let mut partitions: BTreeMap<String, Vec<Note>> = BTreeMap::new();
        let mut known = HashMap::new();
        for note in self.store.list_notes().await? {
            known.insert(note.id.clone(), note.updated_at_or_zero());
            partitions.entry(note.shard_key()).or_default().push(note);
        }

        on_progress(&SyncProgress::ListingShards);
        let remote_keys: BTreeSet<String> = self
            .remote
            .list_entries(&self.layout.notes_dir())
            .await?
            .iter()
            .filter(|entry| !entry.is_collection)
            .filter_map(|entry| shard_key_from_file_name(&entry.name))
            .map(ToOwned::to_owned)
            .collect();

        let keys: BTreeSet<String> = partitions
            .keys()
            .cloned()
            .chain(remote_keys.iter().cloned())
            .collect();
        let total = keys.len();

        for (index, key) in keys.into_iter().rev().enumerate() {
            on_progress(&SyncProgress::Shard {
                key: key.clone(),
                index: index + 1,
                total,
            });
            let local = partitions.remove(&key).unwrap_or_default();
            self.sync_shard(
                &key,
                local,
                remote_keys.contains(&key),
                &mut known,
                &mut report,
            )
            .await?;
            report.shards_processed += 1;
        }

        on_progress(&SyncProgress::Finished);
        info!(%report, "Sync run finished");
        Ok(report)
    }

    async fn sync_shard(
        &self,
        key: &str,
        local: Vec<Note>,
        has_remote: bool,
        known: &mut HashMap<NoteId, i64>,
        report: &mut SyncReport,
    ) -> Result<()> {
        let reconciler =
            AssetReconciler::new(self.store.as_ref(), self.remote.as_ref(), &self.layout);

        let remote = if has_remote {
            match self.fetch_shard(key).await {
                Ok(notes) => notes,
                Err(error) if error.is_authentication() => return Err(error),
                Err(error) => {
                    warn!(shard = key, %error, "Could not read remote shard; leaving it untouched");
                    report.degraded_shards.push(key.to_string());
                    report.add_assets(reconciler.reconcile(&local).await?);
                    return Ok(());
                }
            }
        } else {
            Vec::new()
        };

        let merged = merge_shard(local, remote);
        for note in &merged.pulled {
            // The store may file this id under another week with a newer copy.
            if known
                .get(&note.id)
                .is_some_and(|&local| note.updated_at_or_zero() <= local)
            {
                debug!(shard = key, id = %note.id, "Skipping stale remote copy");
                continue;
            }
            self.store.upsert_note(note).await?;
            known.insert(note.id.clone(), note.updated_at_or_zero());
            report.notes_pulled += 1;
        }

        report.add_assets(reconciler.reconcile(&merged.notes).await?);

        if !has_remote || merged.local_changed {
            let body = serde_json::to_string_pretty(&merged.notes)?;
            self.remote
                .put_text(&self.layout.shard_path(key), &body)
                .await?;
            report.shards_uploaded += 1;
            info!(shard = key, notes = merged.notes.len(), "Uploaded shard");
        }

        Ok(())
    }

    async fn fetch_shard(&self, key: &str) -> Result<Vec<Note>> {
        let body = self.remote.get_text(&self.layout.shard_path(key)).await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&body)?)
    }
}
