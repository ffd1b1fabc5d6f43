use std::path::Path;

use crate::commands::common::{live_notes, normalize_note_identifier, open_database, resolve_note};
use crate::error::CliError;

pub async fn run_attach(
    file: &Path,
    note_query: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let bytes = std::fs::read(file)?;
    let mime_type = mime_guess::from_path(file).first_or_octet_stream();

    let db = open_database(db_path)?;
    let note_id = match note_query {
        Some(query) => {
            let normalized_id = normalize_note_identifier(query)?;
            let notes = live_notes(&db).await?;
            Some(resolve_note(&normalized_id, &notes)?.id.clone())
        }
        None => None,
    };

    let (attachment, note) = db
        .add_attachment(bytes, mime_type.essence_str(), note_id.as_ref())
        .await?;

    println!(
        "{}  {}  {} bytes",
        attachment.id,
        attachment.mime_type,
        attachment.size()
    );
    if let Some(note) = note {
        println!("linked to {}", note.id);
    }
    Ok(())
}
