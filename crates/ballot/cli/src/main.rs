//! Ballot CLI
//!
//! Drives a single persisted voting session: every invocation restores the
//! stored snapshot, applies one command, persists the result and prints it
//! as JSON.

use ballot_store::{FileSnapshotStore, SessionStore};
use ballot_types::BallotError;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::Command;
use config::BallotConfig;

/// Ballot CLI
#[derive(Parser)]
#[command(name = "ballot")]
#[command(about = "Permissioned voting session", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "BALLOT_CONFIG")]
    config: Option<String>,

    /// Session snapshot file
    #[arg(short, long, env = "BALLOT_STATE")]
    state: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "BALLOT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "BALLOT_LOG_JSON")]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = BallotConfig::load(cli.config.as_deref())?;

    // Override with CLI args
    if let Some(state) = cli.state {
        config.storage.state_path = state;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json_logs;

    init_tracing(&config);

    let store = SessionStore::new(
        FileSnapshotStore::new(&config.storage.state_path),
        config.session_config(),
    );
    tracing::debug!(
        state = %config.storage.state_path.display(),
        command = ?cli.command,
        "Executing"
    );

    match commands::execute(&store, &cli.command) {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => match err.downcast_ref::<BallotError>() {
            Some(rejection) => {
                tracing::warn!(reason = %rejection, "Command rejected");
                println!("{}", serde_json::to_string_pretty(&commands::rejection(rejection))?);
                Ok(ExitCode::FAILURE)
            }
            None => Err(err),
        },
    }
}

/// Logs go to stderr; stdout carries the command output
fn init_tracing(config: &BallotConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
