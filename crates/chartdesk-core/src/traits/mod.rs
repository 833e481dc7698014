//! Core traits.

mod indicator;
mod strategy;
mod tick_source;

pub use indicator::{Indicator, MultiOutputIndicator};
pub use strategy::{Strategy, StrategyParameters};
pub use tick_source::TickSource;
