//! Candle data for chartdesk.
//!
//! Live ticks are folded into candles by [`TickAggregator`], which runs every
//! closed candle through the [`IndicatorPipeline`]. Historical candles come
//! from CSV files or the synthetic generators.

pub mod aggregator;
pub mod pipeline;
pub mod synthetic;
mod csv_source;
mod replay;

pub use aggregator::{AggregatorSettings, RejectReason, TickAggregator, TickOutcome};
pub use csv_source::{parse_timestamp, CsvDataSource};
pub use pipeline::{annotate_series, IndicatorCarryState, IndicatorPipeline};
pub use replay::ReplaySource;

use chartdesk_core::error::DataError;
use chartdesk_core::types::{Candle, Tick};
use std::path::Path;

/// Load candles from a CSV file.
pub fn load_candles(path: impl AsRef<Path>) -> Result<Vec<Candle>, DataError> {
    CsvDataSource::new(path)?.load_candles()
}

/// Load ticks from a CSV file.
pub fn load_ticks(path: impl AsRef<Path>) -> Result<Vec<Tick>, DataError> {
    CsvDataSource::new(path)?.load_ticks()
}
