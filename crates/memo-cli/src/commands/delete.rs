use std::path::Path;

use crate::commands::common::{live_notes, normalize_note_identifier, open_database, resolve_note};
use crate::error::CliError;

pub async fn run_delete(id: &str, db_path: &Path) -> Result<(), CliError> {
    let normalized_id = normalize_note_identifier(id)?;
    let db = open_database(db_path)?;
    let notes = live_notes(&db).await?;
    let note = resolve_note(&normalized_id, &notes)?;

    let deleted = db.delete_note(&note.id).await?;
    println!("{}", deleted.id);
    Ok(())
}
