use std::sync::Arc;

use chartdesk_backtest::{BacktestConfig, BacktestEngine, BacktestSettings};
use chartdesk_core::types::ExitReason;
use chartdesk_data::{annotate_series, synthetic};
use chartdesk_strategies::{SmaCrossover, StrategyRegistry};

#[test]
fn sma_crossover_trades_trend_reversal_once() {
    let candles = synthetic::trend_reversal(200, 100.0, 1.0, 60_000);
    let (series, _) = annotate_series(&candles);

    let config = BacktestConfig::new(Arc::new(SmaCrossover::default()), BacktestSettings::default());
    let result = BacktestEngine::new(config).unwrap().run(&series);

    assert_eq!(result.total_trades, 1);
    let trade = &result.trades[0];

    // Entry on the first bar with both averages, early in the uptrend
    assert_eq!(trade.entry_time, 49 * 60_000);
    assert_eq!(trade.entry_price, 149.0);

    // Exit shortly after the peak at bar 99
    let exit_bar = trade.exit_time.unwrap() / 60_000;
    assert!((100..140).contains(&exit_bar), "exit at bar {}", exit_bar);
    assert_eq!(trade.reason, Some(ExitReason::Signal));

    assert!(result.total_pnl > 0.0);
    assert_eq!(result.winning_trades, 1);
    assert_eq!(result.win_rate, 100.0);
    assert_eq!(result.equity.len(), 199);
}

#[test]
fn hold_only_strategy_produces_no_trades() {
    let candles = synthetic::trend_reversal(30, 100.0, 1.0, 60_000);
    let (series, _) = annotate_series(&candles);

    // Slow SMA never warms up on 30 bars
    let strategy = StrategyRegistry::new().create_default("sma_crossover").unwrap();
    let engine = BacktestEngine::new(BacktestConfig::new(strategy, BacktestSettings::default())).unwrap();
    let result = engine.run(&series);

    assert_eq!(result.total_trades, 0);
    assert_eq!(result.total_pnl, 0.0);
    assert_eq!(result.win_rate, 0.0);
    assert_eq!(result.max_drawdown, 0.0);
    assert!(result.equity.iter().all(|e| *e == 10_000.0));
}

#[test]
fn macd_strategy_runs_on_annotated_series() {
    let candles = synthetic::random_walk(300, 100.0, 0.01, 60_000, 42);
    let (series, _) = annotate_series(&candles);

    let strategy = StrategyRegistry::new().create_default("macd").unwrap();
    let engine = BacktestEngine::new(BacktestConfig::new(strategy, BacktestSettings::default())).unwrap();
    let result = engine.run(&series);

    assert!(result.total_trades > 0);
    for trade in &result.trades {
        // MACD is undefined before the slow EMA exists
        assert!(trade.entry_time >= 25 * 60_000);
        assert!(trade.exit_time.unwrap() >= trade.entry_time);
    }
    let ids: Vec<String> = (1..=result.total_trades).map(|n| format!("trade-{}", n)).collect();
    assert_eq!(result.trades.iter().map(|t| t.id.clone()).collect::<Vec<_>>(), ids);
}
