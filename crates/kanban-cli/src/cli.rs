use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kanban")]
#[command(about = "File-backed kanban boards with Trello import", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Directory holding the boards (or set KANBAN_BOARDS_DIR env var)
    #[arg(long, global = true, value_name = "DIR", env = "KANBAN_BOARDS_DIR")]
    pub boards_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Board operations
    Board(BoardCommand),
    /// Card operations
    Card(CardCommand),
    /// Import boards from other tools
    Import(ImportCommand),
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// Board commands
#[derive(Args)]
pub struct BoardCommand {
    #[command(subcommand)]
    pub action: BoardAction,
}

#[derive(Subcommand)]
pub enum BoardAction {
    /// Create a new board
    Create {
        #[arg(long)]
        title: String,
        /// Preferred board id; made unique if taken
        #[arg(long)]
        slug: Option<String>,
    },
    /// List all boards
    List,
    /// Show a board with card bodies and comment counts
    Show { id: String },
    /// Retitle a board, moving it to the new title's id
    Rename {
        id: String,
        #[arg(long)]
        title: String,
    },
    /// Delete a board and everything under it
    Delete { id: String },
}

// Card commands
#[derive(Args)]
pub struct CardCommand {
    #[command(subcommand)]
    pub action: CardAction,
}

#[derive(Subcommand)]
pub enum CardAction {
    /// Move a card to the front of another board
    Move {
        id: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    /// Show a card's comments, activity and revisions
    Meta { board: String, id: String },
    /// Record the previous text of a card description
    Revision {
        board: String,
        id: String,
        #[arg(long)]
        text: String,
        #[arg(long)]
        user: Option<String>,
    },
    /// Delete a card's body and history files
    Delete { board: String, id: String },
}

// Import commands
#[derive(Args)]
pub struct ImportCommand {
    #[command(subcommand)]
    pub action: ImportAction,
}

#[derive(Subcommand)]
pub enum ImportAction {
    /// Create a new board from a Trello JSON export
    Trello { file: PathBuf },
    /// Download the attachments of a Trello export into an imported board
    Attachments { board: String, file: PathBuf },
}
