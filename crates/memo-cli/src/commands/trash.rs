use std::path::Path;

use chrono::Utc;
use memo_core::db::trash_cutoff;

use crate::commands::common::{format_timestamp, note_preview, open_database, short_id};
use crate::error::CliError;

pub async fn run_trash_list(db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let trash = db.list_trash().await?;

    if trash.is_empty() {
        println!("Trash is empty.");
        return Ok(());
    }

    for note in &trash {
        let deleted_at = note
            .deleted_at
            .map_or_else(|| "unknown".to_string(), format_timestamp);
        println!(
            "{:<13}  {:<40}  deleted {deleted_at}",
            short_id(note),
            note_preview(note, 40)
        );
    }
    Ok(())
}

pub async fn run_trash_empty(all: bool, db_path: &Path) -> Result<(), CliError> {
    let cutoff = if all {
        i64::MAX
    } else {
        trash_cutoff(Utc::now().timestamp_millis())
    };

    let db = open_database(db_path)?;
    let erased = db.empty_trash(cutoff).await?;
    println!("Erased {erased} notes");
    Ok(())
}
