//! Error types for chartdesk.
//!
//! Insufficient data (indicator warm-up, short backtest series) is not an
//! error anywhere in the system; it is represented by absent values.

use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum ChartdeskError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Invalid run or application configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: f64,
    },

    #[error("{field} must be at least {minimum}, got {value}")]
    TooSmall {
        field: &'static str,
        minimum: u64,
        value: u64,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Check that a value is finite and strictly positive.
    pub fn require_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::OutOfRange {
                field,
                expected: "a finite number greater than 0",
                value,
            })
        }
    }

    /// Check that a value is finite and not negative.
    pub fn require_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(ConfigError::OutOfRange {
                field,
                expected: "a finite number of at least 0",
                value,
            })
        }
    }
}

/// Strategy-specific errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrategyError {
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Unknown parameter {name} for strategy {strategy}")]
    UnknownParameter { strategy: String, name: String },

    #[error("Strategy not found: {0}")]
    NotFound(String),
}

/// Data source errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("No data available")]
    NoDataAvailable,

    #[error("Invalid timeframe: {0}")]
    InvalidTimeframe(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Market-data feed errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Feed disconnected")]
    Disconnected,

    #[error("Request {req_id} timed out after {timeout_ms} ms")]
    Timeout { req_id: u64, timeout_ms: u64 },

    #[error("Request {req_id} was cancelled")]
    Cancelled { req_id: u64 },

    #[error("Feed rejected request: {code}: {message}")]
    Rejected { code: String, message: String },

    #[error("Malformed message: {0}")]
    Malformed(String),

    #[error("Gave up after {attempts} reconnect attempts")]
    RetriesExhausted { attempts: u32 },
}

/// Result type alias for chartdesk operations.
pub type ChartdeskResult<T> = Result<T, ChartdeskError>;
