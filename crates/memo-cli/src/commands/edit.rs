use std::path::Path;

use crate::commands::common::{
    capture_editor_input_with_initial, live_notes, normalize_content, normalize_note_identifier,
    open_database, resolve_note,
};
use crate::error::CliError;

pub async fn run_edit(id: &str, content_parts: &[String], db_path: &Path) -> Result<(), CliError> {
    let normalized_id = normalize_note_identifier(id)?;
    let db = open_database(db_path)?;
    let notes = live_notes(&db).await?;
    let note = resolve_note(&normalized_id, &notes)?;

    let edited_content = match normalize_content(&content_parts.join(" ")) {
        Some(content) => content,
        None => capture_editor_input_with_initial(&note.content)?
            .ok_or(CliError::EmptyEditedContent)?,
    };

    if edited_content == note.content {
        println!("{}", note.id);
        return Ok(());
    }

    let updated = db.update_note(&note.id, &edited_content).await?;
    println!("{}", updated.id);
    Ok(())
}
