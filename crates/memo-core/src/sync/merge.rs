//! Two-way last-writer-wins merge of one shard.

use std::collections::{BTreeMap, HashSet};

use crate::models::{Note, NoteId};

/// Pick the surviving version of a note.
///
/// The strictly greater `updatedAt` wins (missing counts as 0); a tie or an
/// absent remote keeps the local copy.
#[must_use]
pub fn resolve_conflict<'a>(local: &'a Note, remote: Option<&'a Note>) -> &'a Note {
    match remote {
        Some(remote) if remote.updated_at_or_zero() > local.updated_at_or_zero() => remote,
        _ => local,
    }
}

/// Outcome of merging the local and remote copies of a shard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardMerge {
    /// Every note of the shard after resolution, ordered by creation time
    pub notes: Vec<Note>,
    /// A local note replaced or added to the remote content
    pub local_changed: bool,
    /// Notes to write locally: remote wins and notes only the remote has
    pub pulled: Vec<Note>,
}

/// Merge a shard keyed by note id, seeded from the remote copy.
#[must_use]
pub fn merge_shard(local: Vec<Note>, remote: Vec<Note>) -> ShardMerge {
    let mut merged: BTreeMap<NoteId, Note> = remote
        .into_iter()
        .map(|note| (note.id.clone(), note))
        .collect();
    let mut local_ids = HashSet::with_capacity(local.len());
    let mut local_changed = false;
    let mut pulled = Vec::new();

    for note in local {
        local_ids.insert(note.id.clone());
        let remote = merged.get(&note.id);
        let local_wins = std::ptr::eq(resolve_conflict(&note, remote), &note);

        if local_wins {
            // An identical copy on both sides is not a change.
            if remote != Some(&note) {
                local_changed = true;
                merged.insert(note.id.clone(), note);
            }
        } else if let Some(remote) = remote {
            pulled.push(remote.clone());
        }
    }

    pulled.extend(
        merged
            .values()
            .filter(|note| !local_ids.contains(&note.id))
            .cloned(),
    );

    let mut notes: Vec<Note> = merged.into_values().collect();
    notes.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));

    ShardMerge {
        notes,
        local_changed,
        pulled,
    }
}
