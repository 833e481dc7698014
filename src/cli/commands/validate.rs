//! Validate configuration command.

use anyhow::{bail, Result};
use chartdesk_config::{load_config, DEFAULT_CONFIG_PATH};
use chartdesk_strategies::StrategyRegistry;
use std::path::Path;

use crate::cli::ValidateArgs;

pub fn run(args: &ValidateArgs, config_path: Option<&Path>) -> Result<()> {
    match config_path {
        Some(path) => println!("Validating configuration: {:?}", path),
        None => println!("Validating configuration: {} (optional) and environment", DEFAULT_CONFIG_PATH),
    }

    match load_config(config_path) {
        Ok(config) => {
            let registry = StrategyRegistry::new();
            if !registry.exists(&config.strategy.id) {
                println!("Configuration error: unknown strategy '{}'", config.strategy.id);
                bail!("Unknown strategy '{}'. Available: {}", config.strategy.id, registry.ids().join(", "));
            }

            println!("Configuration is valid!");
            println!();
            println!("App: {}", config.app.name);
            println!("Environment: {}", config.app.environment);
            println!("Symbol: {}", config.app.symbol);
            println!("Log level: {}", config.logging.level);
            println!("Feed URL: {}", config.feed.url);
            println!("Candle interval: {} ms", config.aggregator.interval_ms);
            println!("History limit: {} candles", config.aggregator.history_limit);
            println!("Initial capital: ${:.2}", config.backtest.initial_capital);
            println!("Strategy: {}", config.strategy.id);

            if args.show {
                println!();
                println!("{}", config.to_toml()?);
            }
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
