//! Simulated trade records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trade direction. Short selling is not simulated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Buy,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
        }
    }
}

/// Lifecycle state of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Open,
    Closed,
}

/// Why a trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitReason {
    #[serde(rename = "Sell Signal")]
    Signal,
    #[serde(rename = "Stop Loss")]
    StopLoss,
    #[serde(rename = "Take Profit")]
    TakeProfit,
    #[serde(rename = "End of data")]
    EndOfData,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::Signal => "Sell Signal",
            ExitReason::StopLoss => "Stop Loss",
            ExitReason::TakeProfit => "Take Profit",
            ExitReason::EndOfData => "End of data",
        };
        f.write_str(s)
    }
}

/// A single simulated round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: String,
    pub side: Side,
    pub entry_price: f64,
    /// Bucket start of the entry candle, Unix milliseconds
    pub entry_time: i64,
    pub exit_price: Option<f64>,
    pub exit_time: Option<i64>,
    pub quantity: f64,
    pub pnl: Option<f64>,
    pub status: TradeStatus,
    pub reason: Option<ExitReason>,
}

impl Trade {
    /// Open a long trade.
    pub fn open_long(id: impl Into<String>, entry_price: f64, entry_time: i64, quantity: f64) -> Self {
        Self {
            id: id.into(),
            side: Side::Buy,
            entry_price,
            entry_time,
            exit_price: None,
            exit_time: None,
            quantity,
            pnl: None,
            status: TradeStatus::Open,
            reason: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    /// Mark-to-market PnL of the position at `price`, before costs.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.quantity
    }

    /// Close the trade with an already computed PnL.
    pub fn close(&mut self, exit_price: f64, exit_time: i64, pnl: f64, reason: ExitReason) {
        self.exit_price = Some(exit_price);
        self.exit_time = Some(exit_time);
        self.pnl = Some(pnl);
        self.status = TradeStatus::Closed;
        self.reason = Some(reason);
    }
}
