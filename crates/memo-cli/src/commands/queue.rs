use std::path::Path;

use memo_core::LocalStore;

use crate::commands::common::open_database;
use crate::error::CliError;

pub async fn run_queue(db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let pending = db.deletion_queue().await?;

    if pending.is_empty() {
        println!("No remote deletions pending.");
        return Ok(());
    }

    for id in &pending {
        println!("{id}");
    }
    println!("{} attachments will be removed from the server on next sync", pending.len());
    Ok(())
}
