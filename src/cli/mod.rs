//! CLI definitions.

pub mod commands;

use chartdesk_core::types::Timeframe;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chartdesk")]
#[command(author, version, about = "Tick-to-candle charting, indicators and strategy backtests")]
pub struct Cli {
    /// Configuration file path (defaults to config/default.toml when present)
    #[arg(short, long, global = true, env = "CHARTDESK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level, overrides the configured one
    #[arg(short, long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a strategy over a candle series
    Backtest(BacktestArgs),
    /// Aggregate recorded or generated ticks into annotated candles
    Replay(ReplayArgs),
    /// Aggregate live ticks from the WebSocket feed
    Stream(StreamArgs),
    /// List available strategies
    Strategies,
    /// Validate configuration
    ValidateConfig(ValidateArgs),
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SyntheticKind {
    /// Rising first half, falling second half
    Trend,
    /// Seeded random walk
    Random,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Strategy selection shared by commands that evaluate signals.
#[derive(clap::Args)]
pub struct StrategyArgs {
    /// Strategy id (see `chartdesk strategies`), defaults to the configured one
    #[arg(short, long)]
    pub strategy: Option<String>,

    /// Strategy parameter override, e.g. --param fastPeriod=10
    #[arg(short, long = "param", value_parser = commands::parse_parameter)]
    pub params: Vec<(String, f64)>,
}

#[derive(clap::Args)]
pub struct BacktestArgs {
    #[command(flatten)]
    pub strategy: StrategyArgs,

    /// Candle CSV file (timestamp,open,high,low,close[,volume])
    #[arg(long, conflicts_with_all = ["ticks", "synthetic"])]
    pub data: Option<PathBuf>,

    /// Tick CSV file (timestamp,price), aggregated before the run
    #[arg(long, conflicts_with = "synthetic")]
    pub ticks: Option<PathBuf>,

    /// Generate a synthetic series instead of reading a file
    #[arg(long, value_enum)]
    pub synthetic: Option<SyntheticKind>,

    /// Number of synthetic candles
    #[arg(long, default_value = "200")]
    pub bars: usize,

    /// Seed for the random walk
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Candle interval for aggregated or synthetic data
    #[arg(short, long)]
    pub timeframe: Option<Timeframe>,

    /// Initial capital
    #[arg(long)]
    pub capital: Option<f64>,

    /// Units bought per trade
    #[arg(long)]
    pub position_size: Option<f64>,

    /// Stop loss percentage below entry
    #[arg(long)]
    pub stop_loss: Option<f64>,

    /// Take profit percentage above entry
    #[arg(long)]
    pub take_profit: Option<f64>,

    /// Commission percentage
    #[arg(long)]
    pub commission: Option<f64>,

    /// Slippage percentage
    #[arg(long)]
    pub slippage: Option<f64>,

    /// Include unrealized PnL in the equity curve
    #[arg(long)]
    pub mark_to_market: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Save the JSON report to a file
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Save the equity curve as CSV
    #[arg(long)]
    pub equity_csv: Option<PathBuf>,

    /// Save the trade list as CSV
    #[arg(long)]
    pub trades_csv: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct ReplayArgs {
    #[command(flatten)]
    pub strategy: StrategyArgs,

    /// Tick CSV file (timestamp,price); random ticks are generated when absent
    #[arg(long)]
    pub ticks: Option<PathBuf>,

    /// Number of generated ticks
    #[arg(long, default_value = "5000")]
    pub count: usize,

    /// Milliseconds between generated ticks
    #[arg(long, default_value = "2000")]
    pub spacing_ms: i64,

    /// Seed for generated ticks
    #[arg(long, default_value = "7")]
    pub seed: u64,

    /// Delay between replayed ticks in milliseconds
    #[arg(long)]
    pub pace_ms: Option<u64>,

    /// Candle interval, overrides the configured one
    #[arg(short, long)]
    pub timeframe: Option<Timeframe>,

    /// Candles shown in the final table
    #[arg(long, default_value = "10")]
    pub rows: usize,
}

#[derive(clap::Args)]
pub struct StreamArgs {
    #[command(flatten)]
    pub strategy: StrategyArgs,

    /// Instrument to stream, defaults to the configured one
    #[arg(short = 'S', long)]
    pub symbol: Option<String>,

    /// Feed URL, overrides the configured one
    #[arg(long)]
    pub url: Option<String>,

    /// Seed the candles with this many historical ticks
    #[arg(long, default_value = "0")]
    pub history: usize,

    /// Stop after this many closed candles
    #[arg(long)]
    pub max_candles: Option<usize>,

    /// Candle interval, overrides the configured one
    #[arg(short, long)]
    pub timeframe: Option<Timeframe>,
}

#[derive(clap::Args)]
pub struct ValidateArgs {
    /// Print the effective configuration as TOML
    #[arg(long)]
    pub show: bool,
}
