//! Backtesting engine.
//!
//! Replays strategy decisions over an annotated candle series through a
//! single-position, long-only trade simulator.

mod engine;
mod report;
mod statistics;

pub use engine::{BacktestConfig, BacktestEngine, BacktestSettings};
pub use report::BacktestReport;
pub use statistics::{max_drawdown, returns, sharpe_ratio, BacktestResult};
