//! Core types and traits for chartdesk.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Tick, Candle, CandleSeries, AnnotatedCandle)
//! - Trade records and strategy decisions
//! - Core traits for indicators, strategies and tick sources

pub mod types;
pub mod traits;
pub mod error;

pub use error::{ChartdeskError, ChartdeskResult};
pub use types::*;
pub use traits::*;
