//! Week sharding of notes.
//!
//! Every note lives in exactly one remote shard file, chosen by the ISO-8601
//! week of its creation instant. Replicas must compute identical keys for the
//! same instant, so the calendar date is always taken in UTC.

use chrono::{DateTime, Datelike, Utc};

/// File extension used for shard files on the remote.
pub const SHARD_EXTENSION: &str = ".json";

/// Map a creation timestamp (Unix ms) to its ISO week key, e.g. `2024-W01`.
///
/// Weeks start on Monday and week 1 is the week containing the year's first
/// Thursday, so the year part is the ISO week-year and can differ from the
/// calendar year around New Year. Out-of-range timestamps clamp to the epoch.
#[must_use]
pub fn shard_key(timestamp_ms: i64) -> String {
    let instant = DateTime::<Utc>::from_timestamp_millis(timestamp_ms).unwrap_or_default();
    let week = instant.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// Remote file name for a shard key.
#[must_use]
pub fn shard_file_name(key: &str) -> String {
    format!("{key}{SHARD_EXTENSION}")
}

/// Recover the shard key from a remote file name, if it names a shard file.
#[must_use]
pub fn shard_key_from_file_name(name: &str) -> Option<&str> {
    name.strip_suffix(SHARD_EXTENSION).filter(|key| !key.is_empty())
}
