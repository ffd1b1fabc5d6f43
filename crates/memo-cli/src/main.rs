//! memo CLI - capture notes from the terminal and sync them over WebDAV

mod cli;
mod commands;
mod error;


use clap::{CommandFactory, Parser};

use crate::cli::{Cli, Commands, TrashCommands};
use crate::commands::add::run_add;
use crate::commands::attach::run_attach;
use crate::commands::common::resolve_db_path;
use crate::commands::completions::run_completions;
use crate::commands::delete::run_delete;
use crate::commands::edit::run_edit;
use crate::commands::list::run_list;
use crate::commands::queue::run_queue;
use crate::commands::restore::run_restore;
use crate::commands::sync::run_sync;
use crate::commands::trash::{run_trash_empty, run_trash_list};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "memo=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Completions need no database.
    if let Some(Commands::Completions { shell, output }) = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let db_path = resolve_db_path(cli.db_path)?;

    match cli.command {
        Some(Commands::Add { content }) => run_add(&content, &db_path).await?,
        Some(Commands::List { limit, json }) => run_list(limit, json, &db_path).await?,
        Some(Commands::Edit { id, content }) => run_edit(&id, &content, &db_path).await?,
        Some(Commands::Delete { id }) => run_delete(&id, &db_path).await?,
        Some(Commands::Restore { id }) => run_restore(&id, &db_path).await?,
        Some(Commands::Trash { command }) => match command {
            TrashCommands::List => run_trash_list(&db_path).await?,
            TrashCommands::Empty { all } => run_trash_empty(all, &db_path).await?,
        },
        Some(Commands::Attach { file, note }) => {
            run_attach(&file, note.as_deref(), &db_path).await?;
        }
        Some(Commands::Queue) => run_queue(&db_path).await?,
        Some(Commands::Sync) => run_sync(&db_path).await?,
        Some(Commands::Completions { .. }) => {}
        None => {
            // Quick capture mode: memo "my thought"
            if cli.note.is_empty() {
                Cli::command().print_help().map_err(CliError::Io)?;
                println!();
            } else {
                run_add(&cli.note, &db_path).await?;
            }
        }
    }

    Ok(())
}
