//! Backtest statistics.

use chartdesk_core::types::Trade;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Fully materialized result of one backtest run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResult {
    /// Closed trades in order
    pub trades: Vec<Trade>,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Win rate percentage
    pub win_rate: f64,
    #[serde(rename = "totalPnL")]
    pub total_pnl: f64,
    /// Maximum peak-to-trough drawdown percentage, in [0, 100]
    pub max_drawdown: f64,
    /// Mean over population std dev of bar returns, not annualized
    pub sharpe_ratio: f64,
    /// Average win over average loss
    pub profit_factor: f64,
    pub average_win: f64,
    /// Absolute value of the average losing trade
    pub average_loss: f64,
    pub largest_win: f64,
    /// Most negative trade PnL, or 0
    pub largest_loss: f64,
    /// Capital after each bar
    pub equity: Vec<f64>,
    /// Bucket start of each equity sample
    pub equity_dates: Vec<i64>,
}

impl BacktestResult {
    /// Result of a run that could not trade.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compute statistics from the closed trades and equity curve of a run.
    pub fn from_run(trades: Vec<Trade>, equity: Vec<f64>, equity_dates: Vec<i64>) -> Self {
        let pnls: Vec<f64> = trades.iter().filter_map(|t| t.pnl).collect();
        let wins: Vec<f64> = pnls.iter().copied().filter(|p| *p > 0.0).collect();
        let losses: Vec<f64> = pnls.iter().copied().filter(|p| *p < 0.0).collect();

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            wins.len() as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        let average_win = average(&wins);
        let average_loss = average(&losses).abs();
        let profit_factor = if average_loss > 0.0 {
            average_win / average_loss
        } else {
            0.0
        };

        Self {
            total_trades,
            winning_trades: wins.len(),
            losing_trades: losses.len(),
            win_rate,
            total_pnl: pnls.iter().sum(),
            max_drawdown: max_drawdown(&equity),
            sharpe_ratio: sharpe_ratio(&equity),
            profit_factor,
            average_win,
            average_loss,
            largest_win: wins.iter().copied().fold(0.0, f64::max),
            largest_loss: losses.iter().copied().fold(0.0, f64::min),
            trades,
            equity,
            equity_dates,
        }
    }
}

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Largest drop from a running peak, as a percentage of that peak.
pub fn max_drawdown(equity: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst: f64 = 0.0;

    for &value in equity {
        peak = peak.max(value);
        if peak > 0.0 {
            worst = worst.max((peak - value) / peak * 100.0);
        }
    }

    worst.clamp(0.0, 100.0)
}

/// Bar-over-bar returns of the equity curve, skipping zero bases.
pub fn returns(equity: &[f64]) -> Vec<f64> {
    equity
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

/// Mean return over the population standard deviation of returns.
///
/// 0 when there are no returns or they do not vary.
pub fn sharpe_ratio(equity: &[f64]) -> f64 {
    let returns = returns(equity);
    if returns.is_empty() {
        return 0.0;
    }

    let std_dev = returns.iter().population_std_dev();
    if !std_dev.is_finite() || std_dev == 0.0 {
        return 0.0;
    }
    returns.iter().mean() / std_dev
}
