//! chartdesk CLI application.

mod cli;
mod logging;

use anyhow::{Context, Result};
use chartdesk_config::load_config;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Report configuration problems without needing a logger
    if let Commands::ValidateConfig(args) = &cli.command {
        return cli::commands::validate::run(args, cli.config.as_deref());
    }

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    // Setup logging
    let level = cli
        .log_level
        .map(cli::LogLevel::as_str)
        .unwrap_or(config.logging.level.as_str());
    let _guard = logging::setup_logging(
        level,
        cli.json_logs || config.logging.is_json(),
        config.logging.file.as_deref().map(Path::new),
    )?;

    // Execute command
    match cli.command {
        Commands::Backtest(args) => cli::commands::backtest::run(args, &config),
        Commands::Replay(args) => cli::commands::replay::run(args, &config).await,
        Commands::Stream(args) => cli::commands::stream::run(args, &config).await,
        Commands::Strategies => cli::commands::strategies::run(),
        Commands::ValidateConfig(_) => Ok(()),
    }
}
