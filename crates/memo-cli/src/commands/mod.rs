pub mod add;
pub mod attach;
pub mod common;
pub mod completions;
pub mod delete;
pub mod edit;
pub mod list;
pub mod queue;
pub mod restore;
pub mod sync;
pub mod trash;
