//! Configuration management.

mod settings;

pub use settings::{AppConfig, AppSettings, LoggingConfig, StrategySettings};

use config::{Config, Environment, File, FileFormat};
use std::path::Path;
use thiserror::Error;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Failure to produce a usable configuration.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error(transparent)]
    Invalid(#[from] chartdesk_core::error::ConfigError),
}

fn environment() -> Environment {
    Environment::with_prefix("CHARTDESK")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Load configuration from file and environment.
///
/// With no explicit path the default file is optional and built-in defaults
/// fill the gaps. `CHARTDESK__SECTION__KEY` variables override the file.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, SettingsError> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::new(DEFAULT_CONFIG_PATH, FileFormat::Toml).required(false),
    };

    let config = Config::builder()
        .add_source(file)
        .add_source(environment())
        .build()?;

    finish(config)
}

/// Load configuration from a TOML string, still honoring the environment.
pub fn parse_config(toml: &str) -> Result<AppConfig, SettingsError> {
    let config = Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .add_source(environment())
        .build()?;

    finish(config)
}

fn finish(config: Config) -> Result<AppConfig, SettingsError> {
    let app: AppConfig = config.try_deserialize()?;
    app.validate()?;
    Ok(app)
}
