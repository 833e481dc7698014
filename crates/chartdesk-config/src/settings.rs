//! Configuration structures.

use chartdesk_backtest::BacktestSettings;
use chartdesk_core::error::ConfigError;
use chartdesk_core::traits::StrategyParameters;
use chartdesk_data::AggregatorSettings;
use chartdesk_feed::FeedSettings;
use chartdesk_indicators::periods;
use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub feed: FeedSettings,
    #[serde(default)]
    pub aggregator: AggregatorSettings,
    #[serde(default)]
    pub backtest: BacktestSettings,
    #[serde(default)]
    pub strategy: StrategySettings,
}

impl AppConfig {
    /// Check every section, failing on the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logging.validate()?;
        self.feed.validate()?;
        self.aggregator.validate()?;
        if self.aggregator.history_limit < periods::LONGEST {
            return Err(ConfigError::TooSmall {
                field: "history_limit",
                minimum: periods::LONGEST as u64,
                value: self.aggregator.history_limit as u64,
            });
        }
        self.backtest.validate()?;
        if self.strategy.id.trim().is_empty() {
            return Err(ConfigError::Invalid("strategy id must not be empty".to_string()));
        }
        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// General app settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
    /// Instrument streamed when none is given on the command line
    pub symbol: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "chartdesk".to_string(),
            environment: "development".to_string(),
            symbol: "R_100".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
    /// Also write logs to this file
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(ConfigError::Invalid(format!(
                "logging format must be \"pretty\" or \"json\", got \"{}\"",
                other
            ))),
        }
    }

    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}

/// Strategy used by `backtest` and `replay` when none is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySettings {
    pub id: String,
    /// Overrides applied to the strategy's defaults
    pub parameters: StrategyParameters,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            id: "sma_crossover".to_string(),
            parameters: StrategyParameters::new(),
        }
    }
}

impl StrategySettings {
    /// Map configured parameter names onto the strategy's own spelling.
    ///
    /// The config loader lowercases keys, so `fastPeriod` arrives as
    /// `fastperiod`. Names with no case-insensitive match are kept as given.
    pub fn resolve_parameters(&self, defaults: &StrategyParameters) -> StrategyParameters {
        self.parameters
            .iter()
            .map(|(name, value)| {
                let resolved = defaults
                    .keys()
                    .find(|known| known.eq_ignore_ascii_case(name))
                    .unwrap_or(name);
                (resolved.clone(), *value)
            })
            .collect()
    }
}
