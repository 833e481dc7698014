//! Technical indicators over close-price series.
//!
//! Every indicator comes in two shapes:
//! - a point function (`sma`, `ema`, `rsi`, `macd`, `bollinger`) that answers
//!   for the latest price and returns `None` while warming up;
//! - a batch type implementing [`chartdesk_core::Indicator`] or
//!   [`chartdesk_core::MultiOutputIndicator`] that computes the whole series.
//!
//! Both shapes share the same window kernels, so a value computed
//! incrementally matches the one computed from scratch.

pub mod momentum;
pub mod moving_average;
pub mod volatility;

pub use momentum::{macd, rsi, Macd, MacdOutput, MacdParams, MacdStep, Rsi};
pub use moving_average::{ema, ema_multiplier, sma, Ema, Sma};
pub use volatility::{bollinger, BollingerBands, BollingerOutput, StdDev};

/// Default lookbacks used across the pipeline.
pub mod periods {
    pub const SMA_FAST: usize = 20;
    pub const SMA_SLOW: usize = 50;
    pub const EMA_FAST: usize = 12;
    pub const EMA_SLOW: usize = 26;
    pub const MACD_SIGNAL: usize = 9;
    pub const RSI: usize = 14;
    pub const BOLLINGER: usize = 20;
    pub const BOLLINGER_MULTIPLIER: f64 = 2.0;

    /// Longest lookback of any default indicator.
    pub const LONGEST: usize = SMA_SLOW;
}
