//! memo-core - Core library for memo
//!
//! This crate contains the note models, the local `SQLite` store, and the
//! WebDAV sync engine shared by memo front-ends.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod remote;
pub mod services;
pub mod shard;
pub mod store;
pub mod sync;
pub mod util;

pub use config::{SyncConfig, WebDavConfig};
pub use error::{Error, Result};
pub use models::{Attachment, AttachmentId, Note, NoteId};
pub use remote::{RemoteError, RemoteTransport, WebDavClient};
pub use services::DatabaseService;
pub use store::{LocalStore, MemoryStore};
pub use sync::{RemoteLayout, SyncEngine, SyncProgress, SyncReport};
