use clap::Parser;

use crate::{
    commands::{EntryKind, Session},
    config::{Cli, Command},
    error::Result,
};

mod commands;
mod config;
mod dashboard;
mod error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = config::load(&cli)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "expense_tracker={level},client={level},engine={level}",
            level = settings.log_level
        ))
        .with_writer(std::io::stderr)
        .init();

    let session = Session::connect(&settings, cli.command.category()).await?;
    let outcome = match &cli.command {
        Command::Dashboard { range, .. } => commands::dashboard(&session, range).await,
        Command::Watch { range, .. } => commands::watch(&session, range).await,
        Command::Export {
            range,
            output,
            remote,
        } => commands::export(&session, range, output, *remote).await,
        Command::Expense(entry) => commands::entry(&session, EntryKind::Expense, entry).await,
        Command::Income(entry) => commands::entry(&session, EntryKind::Income, entry).await,
    };
    session.close().await;
    outcome
}
