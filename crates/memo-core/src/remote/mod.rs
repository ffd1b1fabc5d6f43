//! Remote blob store access.
//!
//! The sync engine talks to the remote exclusively through [`RemoteTransport`].
//! [`WebDavClient`] is the production implementation; tests plug in fakes.

mod error;
mod propfind;
mod retry;
mod webdav;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use error::{RemoteError, RemoteResult};
pub use propfind::{parse_multistatus, PROPFIND_BODY};
pub use retry::{with_retry, Backoff, RetryPolicy, Retryable, DEFAULT_MAX_RETRIES};
pub use webdav::WebDavClient;

/// One child of a listed collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Last path segment, decoded
    pub name: String,
    /// Full decoded server path
    pub path: String,
    pub is_collection: bool,
    pub last_modified: Option<DateTime<Utc>>,
    /// Content length in bytes (0 for collections)
    pub size: u64,
}

/// Whole-resource operations against a remote store.
///
/// Paths are relative to the store's base URL and use `/` as separator.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// Whether a resource exists. Never fails; errors read as "absent".
    async fn exists(&self, path: &str) -> bool;

    /// Create a collection, succeeding if it is already there.
    async fn ensure_collection(&self, path: &str) -> RemoteResult<()>;

    /// Shallow listing of a collection, without the collection itself.
    async fn list_entries(&self, path: &str) -> RemoteResult<Vec<RemoteEntry>>;

    async fn get_text(&self, path: &str) -> RemoteResult<String>;

    async fn put_text(&self, path: &str, body: &str) -> RemoteResult<()>;

    async fn get_binary(&self, path: &str) -> RemoteResult<Vec<u8>>;

    async fn put_binary(&self, path: &str, body: &[u8]) -> RemoteResult<()>;

    /// Delete a resource. A missing resource counts as deleted.
    async fn delete(&self, path: &str) -> RemoteResult<()>;
}
