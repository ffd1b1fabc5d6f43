//! Database layer for memo

mod connection;
mod migrations;
mod repository;

pub use connection::Database;
pub use repository::{trash_cutoff, NoteRepository, SqliteNoteRepository, TRASH_RETENTION};
