use std::path::Path;

use crate::commands::common::{normalize_note_identifier, open_database, resolve_note};
use crate::error::CliError;

pub async fn run_restore(id: &str, db_path: &Path) -> Result<(), CliError> {
    let normalized_id = normalize_note_identifier(id)?;
    let db = open_database(db_path)?;
    let trash = db.list_trash().await?;
    let note = resolve_note(&normalized_id, &trash)?;

    let restored = db.restore_note(&note.id).await?;
    println!("{}", restored.id);
    Ok(())
}
