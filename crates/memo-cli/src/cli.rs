use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "memo")]
#[command(about = "Local-first notes with WebDAV sync")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Quick capture: memo "my thought here"
    #[arg(trailing_var_arg = true)]
    pub note: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new note
    #[command(alias = "new")]
    Add {
        /// Note content
        content: Vec<String>,
    },
    /// List recent notes
    List {
        /// Number of notes to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an existing note
    Edit {
        /// Note ID or unique ID prefix
        id: String,
        /// Replacement content (opens $EDITOR when omitted)
        content: Vec<String>,
    },
    /// Move a note to the trash
    Delete {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Bring a note back from the trash
    Restore {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Inspect or empty the trash
    Trash {
        #[command(subcommand)]
        command: TrashCommands,
    },
    /// Store a file as an attachment
    Attach {
        /// File to attach
        file: PathBuf,
        /// Note ID or unique ID prefix to link the attachment to
        #[arg(long, value_name = "ID")]
        note: Option<String>,
    },
    /// Show attachments waiting for remote deletion
    Queue,
    /// Sync notes and attachments with the WebDAV server
    Sync,
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum TrashCommands {
    /// List trashed notes
    List,
    /// Permanently erase trashed notes past retention
    Empty {
        /// Erase every trashed note regardless of age
        #[arg(long)]
        all: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
