//! Backtesting engine.

use chartdesk_core::error::ConfigError;
use chartdesk_core::traits::Strategy;
use chartdesk_core::types::{AnnotatedCandle, Decision, ExitReason, Trade};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::report::BacktestReport;
use crate::statistics::BacktestResult;

/// Numeric backtest settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    /// Starting capital
    pub initial_capital: f64,
    /// Units bought per trade
    pub position_size: f64,
    /// Close a long once price falls this many percent below entry
    pub stop_loss_pct: Option<f64>,
    /// Close a long once price rises this many percent above entry
    pub take_profit_pct: Option<f64>,
    /// Flat commission term, charged once per round trip as `pct / 100 * 2`
    pub commission_pct: f64,
    /// Slippage percentage of the exit price
    pub slippage_pct: f64,
    /// Include the open position's unrealized PnL in the equity curve
    pub mark_to_market: bool,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            position_size: 1.0,
            stop_loss_pct: None,
            take_profit_pct: None,
            commission_pct: 0.0,
            slippage_pct: 0.0,
            mark_to_market: false,
        }
    }
}

impl BacktestSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_positive("initial_capital", self.initial_capital)?;
        ConfigError::require_positive("position_size", self.position_size)?;
        ConfigError::require_non_negative("commission_pct", self.commission_pct)?;
        ConfigError::require_non_negative("slippage_pct", self.slippage_pct)?;

        if let Some(sl) = self.stop_loss_pct {
            if !(sl.is_finite() && sl > 0.0 && sl < 100.0) {
                return Err(ConfigError::OutOfRange {
                    field: "stop_loss_pct",
                    expected: "between 0 and 100 (exclusive)",
                    value: sl,
                });
            }
        }
        if let Some(tp) = self.take_profit_pct {
            ConfigError::require_positive("take_profit_pct", tp)?;
        }
        Ok(())
    }
}

/// Backtest configuration: a strategy plus the settings for one run.
#[derive(Clone)]
pub struct BacktestConfig {
    pub strategy: Arc<dyn Strategy>,
    pub settings: BacktestSettings,
}

impl BacktestConfig {
    pub fn new(strategy: Arc<dyn Strategy>, settings: BacktestSettings) -> Self {
        Self { strategy, settings }
    }
}

impl fmt::Debug for BacktestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BacktestConfig")
            .field("strategy", &self.strategy.id())
            .field("parameters", self.strategy.parameters())
            .field("settings", &self.settings)
            .finish()
    }
}

/// Single-position, long-only backtesting engine.
///
/// A run is a synchronous pass over an in-memory annotated series. Only
/// `series[..=i]` is shown to the strategy on bar `i`.
#[derive(Debug, Clone)]
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    /// Create a new backtest engine, rejecting invalid settings.
    pub fn new(config: BacktestConfig) -> Result<Self, ConfigError> {
        config.settings.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run a backtest over `series`.
    pub fn run(&self, series: &[AnnotatedCandle]) -> BacktestResult {
        let settings = &self.config.settings;
        let strategy = self.config.strategy.as_ref();

        if series.len() < 2 {
            debug!(bars = series.len(), "Series too short to backtest");
            return BacktestResult::empty();
        }

        let mut capital = settings.initial_capital;
        let mut position: Option<Trade> = None;
        let mut trades: Vec<Trade> = Vec::new();
        // One sample per traded bar; bar 0 only provides context
        let mut equity = Vec::with_capacity(series.len() - 1);
        let mut equity_dates = Vec::with_capacity(series.len() - 1);

        for i in 1..series.len() {
            let candle = &series[i];
            let price = candle.close();
            let decision = strategy.signal(&series[..=i], i, strategy.parameters());

            match decision {
                Decision::Buy if position.is_none() => {
                    let id = format!("trade-{}", trades.len() + 1);
                    debug!(id = %id, price, time = candle.timestamp(), "Opened long");
                    position = Some(Trade::open_long(id, price, candle.timestamp(), settings.position_size));
                }
                Decision::Sell => {
                    if let Some(trade) = position.take() {
                        capital += self.close_trade(trade, price, candle.timestamp(), ExitReason::Signal, &mut trades);
                    }
                }
                _ => {}
            }

            if let Some(reason) = position.as_ref().and_then(|t| self.exit_trigger(t, price)) {
                if let Some(trade) = position.take() {
                    capital += self.close_trade(trade, price, candle.timestamp(), reason, &mut trades);
                }
            }

            let unrealized = match &position {
                Some(trade) if settings.mark_to_market => trade.unrealized_pnl(price),
                _ => 0.0,
            };
            equity.push(capital + unrealized);
            equity_dates.push(candle.timestamp());
        }

        if let Some(trade) = position.take() {
            if let Some(last) = series.last() {
                capital += self.close_trade(trade, last.close(), last.timestamp(), ExitReason::EndOfData, &mut trades);
            }
            // A marked sample still carries the exit costs of the forced close
            if settings.mark_to_market {
                if let Some(sample) = equity.last_mut() {
                    *sample = capital;
                }
            }
        }

        let result = BacktestResult::from_run(trades, equity, equity_dates);
        info!(
            strategy = strategy.id(),
            bars = series.len(),
            trades = result.total_trades,
            total_pnl = result.total_pnl,
            max_drawdown = result.max_drawdown,
            "Backtest complete"
        );
        result
    }

    /// Run and wrap the result in a report.
    pub fn run_report(&self, series: &[AnnotatedCandle]) -> BacktestReport {
        BacktestReport::new(&self.config, series.len(), self.run(series))
    }

    /// Realized PnL of closing at `exit_price`, after costs.
    pub fn trade_pnl(&self, entry_price: f64, exit_price: f64, quantity: f64) -> f64 {
        let settings = &self.config.settings;
        (exit_price - entry_price) * quantity
            - settings.commission_pct / 100.0 * 2.0
            - exit_price * settings.slippage_pct / 100.0
    }

    fn exit_trigger(&self, trade: &Trade, price: f64) -> Option<ExitReason> {
        let settings = &self.config.settings;
        if let Some(sl) = settings.stop_loss_pct {
            if price <= trade.entry_price * (1.0 - sl / 100.0) {
                return Some(ExitReason::StopLoss);
            }
        }
        if let Some(tp) = settings.take_profit_pct {
            if price >= trade.entry_price * (1.0 + tp / 100.0) {
                return Some(ExitReason::TakeProfit);
            }
        }
        None
    }

    fn close_trade(
        &self,
        mut trade: Trade,
        exit_price: f64,
        exit_time: i64,
        reason: ExitReason,
        trades: &mut Vec<Trade>,
    ) -> f64 {
        let pnl = self.trade_pnl(trade.entry_price, exit_price, trade.quantity);
        trade.close(exit_price, exit_time, pnl, reason);
        debug!(id = %trade.id, exit_price, pnl, reason = %reason, "Closed long");
        trades.push(trade);
        pnl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartdesk_core::traits::StrategyParameters;
    use chartdesk_core::types::{Candle, TradeStatus};

    /// Plays back a fixed decision per bar.
    struct Scripted {
        decisions: Vec<Decision>,
        parameters: StrategyParameters,
    }

    impl Strategy for Scripted {
        fn id(&self) -> &str {
            "scripted"
        }

        fn name(&self) -> &str {
            "Scripted"
        }

        fn parameters(&self) -> &StrategyParameters {
            &self.parameters
        }

        fn signal(&self, _series: &[AnnotatedCandle], index: usize, _p: &StrategyParameters) -> Decision {
            self.decisions.get(index).copied().unwrap_or_default()
        }
    }

    fn scripted(decisions: &[Decision]) -> Arc<dyn Strategy> {
        Arc::new(Scripted {
            decisions: decisions.to_vec(),
            parameters: StrategyParameters::new(),
        })
    }

    fn series(closes: &[f64]) -> Vec<AnnotatedCandle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &p)| Candle::flat(i as i64 * 60_000, p).into())
            .collect()
    }

    fn engine(decisions: &[Decision], settings: BacktestSettings) -> BacktestEngine {
        BacktestEngine::new(BacktestConfig::new(scripted(decisions), settings)).unwrap()
    }

    use Decision::{Buy, Hold, Sell};

    #[test]
    fn test_signal_round_trip() {
        let engine = engine(&[Hold, Buy, Hold, Sell, Hold], BacktestSettings::default());
        let result = engine.run(&series(&[10.0, 10.0, 11.0, 12.0, 12.0]));

        assert_eq!(result.total_trades, 1);
        let trade = &result.trades[0];
        assert_eq!(trade.id, "trade-1");
        assert_eq!(trade.entry_price, 10.0);
        assert_eq!(trade.entry_time, 60_000);
        assert_eq!(trade.exit_price, Some(12.0));
        assert_eq!(trade.status, TradeStatus::Closed);
        assert_eq!(trade.reason, Some(ExitReason::Signal));
        assert!((result.total_pnl - 2.0).abs() < 1e-12);

        assert_eq!(result.equity, vec![10_000.0, 10_000.0, 10_002.0, 10_002.0]);
        assert_eq!(result.equity_dates, vec![60_000, 120_000, 180_000, 240_000]);
    }

    #[test]
    fn test_bar_zero_is_never_traded() {
        let engine = engine(&[Buy, Hold, Hold], BacktestSettings::default());
        let result = engine.run(&series(&[1.0, 2.0, 3.0]));
        assert_eq!(result.total_trades, 0);
    }

    #[test]
    fn test_costs_applied() {
        let settings = BacktestSettings {
            commission_pct: 0.5,
            slippage_pct: 1.0,
            position_size: 2.0,
            ..Default::default()
        };
        let engine = engine(&[Hold, Buy, Sell], settings);
        let result = engine.run(&series(&[100.0, 100.0, 110.0]));

        // (110 - 100) * 2 - 0.5/100*2 - 110*1/100
        let expected = 20.0 - 0.01 - 1.1;
        assert!((result.total_pnl - expected).abs() < 1e-9);
        assert!((engine.trade_pnl(100.0, 110.0, 2.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_stop_loss() {
        let settings = BacktestSettings {
            stop_loss_pct: Some(5.0),
            ..Default::default()
        };
        let engine = engine(&[Hold, Buy, Hold, Hold, Hold], settings);
        let result = engine.run(&series(&[100.0, 100.0, 97.0, 94.0, 90.0]));

        assert_eq!(result.total_trades, 1);
        let trade = &result.trades[0];
        assert_eq!(trade.reason, Some(ExitReason::StopLoss));
        assert_eq!(trade.exit_price, Some(94.0));
        assert_eq!(trade.exit_time, Some(3 * 60_000));
    }

    #[test]
    fn test_take_profit() {
        let settings = BacktestSettings {
            take_profit_pct: Some(10.0),
            ..Default::default()
        };
        let engine = engine(&[Hold, Buy, Hold, Hold], settings);
        let result = engine.run(&series(&[100.0, 100.0, 105.0, 111.0]));

        assert_eq!(result.trades[0].reason, Some(ExitReason::TakeProfit));
        assert!((result.total_pnl - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_end_of_data_close_keeps_realized_curve() {
        let engine = engine(&[Hold, Buy, Hold], BacktestSettings::default());
        let result = engine.run(&series(&[50.0, 50.0, 55.0]));

        assert_eq!(result.trades[0].reason, Some(ExitReason::EndOfData));
        assert!((result.total_pnl - 5.0).abs() < 1e-12);
        // Samples are taken before the forced close and never rewritten
        assert_eq!(result.equity, vec![10_000.0, 10_000.0]);
        assert_eq!(result.max_drawdown, 0.0);
        assert_eq!(result.sharpe_ratio, 0.0);
    }

    #[test]
    fn test_mark_to_market() {
        let settings = BacktestSettings {
            mark_to_market: true,
            ..Default::default()
        };
        let engine = engine(&[Hold, Buy, Hold, Sell], settings);
        let result = engine.run(&series(&[10.0, 10.0, 8.0, 12.0]));

        assert_eq!(result.equity, vec![10_000.0, 9_998.0, 10_002.0]);
    }

    #[test]
    fn test_mark_to_market_restates_forced_close() {
        let settings = BacktestSettings {
            mark_to_market: true,
            slippage_pct: 1.0,
            ..Default::default()
        };
        let engine = engine(&[Hold, Buy, Hold], settings);
        let result = engine.run(&series(&[50.0, 50.0, 55.0]));

        // Unrealized 5.0 on the last bar, realized 5.0 - 0.55 after the close
        assert_eq!(result.equity.len(), 2);
        assert!((result.equity[1] - (10_000.0 + 5.0 - 0.55)).abs() < 1e-9);
    }

    #[test]
    fn test_single_position_only() {
        let engine = engine(&[Hold, Buy, Buy, Buy, Sell, Sell], BacktestSettings::default());
        let result = engine.run(&series(&[1.0, 1.0, 2.0, 3.0, 4.0, 5.0]));

        assert_eq!(result.total_trades, 1);
        assert_eq!(result.trades[0].entry_price, 1.0);
    }

    #[test]
    fn test_short_series_is_empty() {
        let engine = engine(&[Buy], BacktestSettings::default());
        assert_eq!(engine.run(&series(&[1.0])), BacktestResult::empty());
        assert_eq!(engine.run(&[]), BacktestResult::empty());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let cases = [
            BacktestSettings { initial_capital: 0.0, ..Default::default() },
            BacktestSettings { position_size: -1.0, ..Default::default() },
            BacktestSettings { commission_pct: -0.1, ..Default::default() },
            BacktestSettings { slippage_pct: f64::NAN, ..Default::default() },
            BacktestSettings { stop_loss_pct: Some(100.0), ..Default::default() },
            BacktestSettings { stop_loss_pct: Some(0.0), ..Default::default() },
            BacktestSettings { take_profit_pct: Some(0.0), ..Default::default() },
        ];

        for settings in cases {
            let config = BacktestConfig::new(scripted(&[]), settings.clone());
            assert!(BacktestEngine::new(config).is_err(), "{:?} should be rejected", settings);
        }
    }
}
