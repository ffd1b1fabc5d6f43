//! Services shared by the memo front-ends.

mod database;

pub use database::DatabaseService;
