//! Core data types.

mod candle;
mod decision;
mod tick;
mod timeframe;
mod trade;

pub use candle::{AnnotatedCandle, Candle, CandleSeries};
pub use decision::Decision;
pub use tick::Tick;
pub use timeframe::Timeframe;
pub use trade::{ExitReason, Side, Trade, TradeStatus};
