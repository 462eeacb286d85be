mod cli;
mod context;
mod handlers;
mod output;

use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use context::CliContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Ok(log_path) = std::env::var("KANBAN_DEBUG_LOG") {
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        tracing_subscriber::fmt()
            .with_writer(log_file)
            .with_max_level(tracing::Level::DEBUG)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_max_level(tracing::Level::WARN)
            .init();
    }

    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "kanban", &mut std::io::stdout());
        return Ok(());
    }

    let ctx = CliContext::load(cli.boards_dir);

    let result = match cli.command {
        Commands::Board(board_cmd) => handlers::board::handle(&ctx, board_cmd.action).await,
        Commands::Card(card_cmd) => handlers::card::handle(&ctx, card_cmd.action).await,
        Commands::Import(import_cmd) => handlers::import::handle(&ctx, import_cmd.action).await,
        Commands::Completions { .. } => Ok(()),
    };

    if let Err(err) = result {
        tracing::debug!("Command failed: {:?}", err);
        output::output_error(&err.to_string());
    }

    Ok(())
}
