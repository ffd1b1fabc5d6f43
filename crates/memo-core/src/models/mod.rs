//! Data models for memo

mod attachment;
mod note;

pub use attachment::{Attachment, AttachmentId, DEFAULT_MIME_TYPE};
pub use note::{Note, NoteId};
