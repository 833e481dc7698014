//! Backtest report generation.

use chartdesk_core::traits::StrategyParameters;
use chartdesk_core::types::Trade;
use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::engine::{BacktestConfig, BacktestSettings};
use crate::statistics::BacktestResult;

/// Complete backtest report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestReport {
    pub strategy_id: String,
    pub strategy_name: String,
    pub parameters: StrategyParameters,
    /// Settings used
    pub settings: BacktestSettings,
    /// Number of candles in the series
    pub bars: usize,
    pub result: BacktestResult,
}

impl BacktestReport {
    pub fn new(config: &BacktestConfig, bars: usize, result: BacktestResult) -> Self {
        Self {
            strategy_id: config.strategy.id().to_string(),
            strategy_name: config.strategy.name().to_string(),
            parameters: config.strategy.parameters().clone(),
            settings: config.settings.clone(),
            bars,
            result,
        }
    }

    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let r = &self.result;
        // Includes the end-of-data close, which the equity curve does not
        let final_capital = self.settings.initial_capital + r.total_pnl;
        let return_pct = r.total_pnl / self.settings.initial_capital * 100.0;

        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s.push_str("                     BACKTEST REPORT                        \n");
        s.push_str("═══════════════════════════════════════════════════════════\n\n");

        s.push_str("STRATEGY\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Name:                {} ({})\n", self.strategy_name, self.strategy_id));
        for (name, value) in &self.parameters {
            s.push_str(&format!("  {:<21}{}\n", format!("{}:", name), value));
        }
        s.push('\n');

        s.push_str("PERFORMANCE\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Initial Capital:     ${:.2}\n", self.settings.initial_capital));
        s.push_str(&format!("  Final Capital:       ${:.2}\n", final_capital));
        s.push_str(&format!("  Total PnL:           ${:.2}\n", r.total_pnl));
        s.push_str(&format!("  Total Return:        {:.2}%\n", return_pct));
        s.push_str(&format!("  Max Drawdown:        {:.2}%\n", r.max_drawdown));
        s.push('\n');

        s.push_str("RISK METRICS\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Sharpe Ratio:        {:.2}\n", r.sharpe_ratio));
        s.push_str(&format!("  Profit Factor:       {:.2}\n", r.profit_factor));
        s.push('\n');

        s.push_str("TRADE STATISTICS\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Total Trades:        {}\n", r.total_trades));
        s.push_str(&format!("  Winning Trades:      {}\n", r.winning_trades));
        s.push_str(&format!("  Losing Trades:       {}\n", r.losing_trades));
        s.push_str(&format!("  Win Rate:            {:.2}%\n", r.win_rate));
        s.push_str(&format!("  Avg Win:             ${:.2}\n", r.average_win));
        s.push_str(&format!("  Avg Loss:            ${:.2}\n", r.average_loss));
        s.push_str(&format!("  Largest Win:         ${:.2}\n", r.largest_win));
        s.push_str(&format!("  Largest Loss:        ${:.2}\n", r.largest_loss));
        s.push('\n');

        s.push_str("EXECUTION\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Bars Processed:      {}\n", self.bars));
        s.push_str(&format!("  Equity Points:       {}\n", r.equity.len()));
        s.push('\n');

        s.push_str("═══════════════════════════════════════════════════════════\n");

        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV (equity curve only).
    pub fn equity_to_csv(&self) -> String {
        let mut csv = String::from("timestamp,datetime,equity\n");
        for (ts, equity) in self.result.equity_dates.iter().zip(&self.result.equity) {
            let datetime = DateTime::from_timestamp_millis(*ts)
                .map(|d| d.to_rfc3339())
                .unwrap_or_default();
            csv.push_str(&format!("{},{},{}\n", ts, datetime, equity));
        }
        csv
    }

    /// Export the trade list to CSV.
    pub fn trades_to_csv(&self) -> String {
        let mut csv = String::from("id,entry_time,entry_price,exit_time,exit_price,quantity,pnl,reason\n");
        for trade in &self.result.trades {
            csv.push_str(&trade_row(trade));
        }
        csv
    }
}

fn trade_row(trade: &Trade) -> String {
    let opt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
    format!(
        "{},{},{},{},{},{},{},{}\n",
        trade.id,
        trade.entry_time,
        trade.entry_price,
        trade.exit_time.map(|t| t.to_string()).unwrap_or_default(),
        opt(trade.exit_price),
        trade.quantity,
        opt(trade.pnl),
        trade.reason.map(|r| r.to_string()).unwrap_or_default(),
    )
}
