//! Backtest command implementation.

use anyhow::{bail, Context, Result};
use chartdesk_backtest::{BacktestConfig, BacktestEngine, BacktestSettings};
use chartdesk_config::AppConfig;
use chartdesk_core::types::{AnnotatedCandle, Tick};
use chartdesk_data::synthetic::{random_walk, trend_reversal};
use chartdesk_data::{annotate_series, load_candles, load_ticks, AggregatorSettings, TickAggregator, TickOutcome};
use std::path::Path;
use tracing::info;

use super::build_strategy;
use crate::cli::{BacktestArgs, OutputFormat, SyntheticKind};

pub fn run(args: BacktestArgs, config: &AppConfig) -> Result<()> {
    let strategy = build_strategy(config, &args.strategy)?;
    let interval_ms = args
        .timeframe
        .map(|t| t.as_millis())
        .unwrap_or(config.aggregator.interval_ms);

    let series = load_series(&args, config, interval_ms)?;
    info!(candles = series.len(), strategy = strategy.id(), "Starting backtest");

    let settings = settings_from_args(&args, &config.backtest);
    let engine = BacktestEngine::new(BacktestConfig::new(strategy, settings))
        .context("Invalid backtest settings")?;
    let report = engine.run_report(&series);

    // Output results
    match args.output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => println!("{}", report.summary()),
    }

    // Save if requested
    if let Some(path) = &args.save {
        std::fs::write(path, report.to_json()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Results saved to {:?}", path);
    }
    if let Some(path) = &args.equity_csv {
        std::fs::write(path, report.equity_to_csv())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Equity curve saved to {:?}", path);
    }
    if let Some(path) = &args.trades_csv {
        std::fs::write(path, report.trades_to_csv())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Trades saved to {:?}", path);
    }

    Ok(())
}

fn settings_from_args(args: &BacktestArgs, base: &BacktestSettings) -> BacktestSettings {
    BacktestSettings {
        initial_capital: args.capital.unwrap_or(base.initial_capital),
        position_size: args.position_size.unwrap_or(base.position_size),
        stop_loss_pct: args.stop_loss.or(base.stop_loss_pct),
        take_profit_pct: args.take_profit.or(base.take_profit_pct),
        commission_pct: args.commission.unwrap_or(base.commission_pct),
        slippage_pct: args.slippage.unwrap_or(base.slippage_pct),
        mark_to_market: args.mark_to_market || base.mark_to_market,
    }
}

fn load_series(args: &BacktestArgs, config: &AppConfig, interval_ms: i64) -> Result<Vec<AnnotatedCandle>> {
    if let Some(path) = &args.data {
        ensure_exists(path)?;
        let candles = load_candles(path).with_context(|| format!("Failed to load candles from {}", path.display()))?;
        info!(candles = candles.len(), "Loaded candle data");
        return Ok(annotate_series(&candles).0);
    }

    if let Some(path) = &args.ticks {
        ensure_exists(path)?;
        let ticks = load_ticks(path).with_context(|| format!("Failed to load ticks from {}", path.display()))?;
        info!(ticks = ticks.len(), "Loaded tick data");
        return aggregate(ticks, &config.aggregator, interval_ms);
    }

    let candles = match args.synthetic {
        Some(SyntheticKind::Trend) => trend_reversal(args.bars, 100.0, 1.0, interval_ms),
        Some(SyntheticKind::Random) => random_walk(args.bars, 100.0, 0.01, interval_ms, args.seed),
        None => bail!("Please provide --data, --ticks or --synthetic (e.g. --synthetic trend)"),
    };
    Ok(annotate_series(&candles).0)
}

fn ensure_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("Data path '{}' does not exist", path.display());
    }
    Ok(())
}

/// Fold ticks into closed, annotated candles.
///
/// Candles are collected as they close, so the aggregator keeps its usual
/// bounded history. The last candle is closed once the ticks run out.
fn aggregate(ticks: Vec<Tick>, base: &AggregatorSettings, interval_ms: i64) -> Result<Vec<AnnotatedCandle>> {
    let Some(last) = ticks.last().map(|t| t.timestamp) else {
        return Ok(Vec::new());
    };

    let settings = AggregatorSettings {
        interval_ms,
        ..base.clone()
    };
    let mut aggregator = TickAggregator::new(settings).context("Invalid aggregator settings")?;

    let mut series = Vec::new();
    for tick in ticks {
        if let TickOutcome::Rolled { gaps, .. } = aggregator.push_tick(tick) {
            series.extend(aggregator.recent(gaps + 1).copied());
        }
    }
    series.extend(aggregator.flush(last.saturating_add(interval_ms)));

    info!(candles = series.len(), interval_ms, "Aggregated ticks");
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_keeps_every_candle() {
        // More candles than the history holds, one tick each
        let ticks: Vec<Tick> = (0..500).map(|i| Tick::new(100.0 + i as f64, i * 60_000)).collect();
        let series = aggregate(ticks, &AggregatorSettings::default(), 60_000).unwrap();

        assert_eq!(series.len(), 500);
        assert_eq!(series[0].timestamp(), 0);
        assert_eq!(series[499].close(), 599.0);
        assert!(series.windows(2).all(|w| w[1].timestamp() - w[0].timestamp() == 60_000));
        assert!(series[499].sma50.is_some());
    }

    #[test]
    fn test_aggregate_sparse_ticks_with_gaps() {
        let settings = AggregatorSettings {
            fill_gaps: true,
            ..Default::default()
        };
        let ticks = vec![
            Tick::new(1.0, 0),
            Tick::new(2.0, 3 * 60_000),
            // Far beyond the history, left as one transition
            Tick::new(3.0, 10_000_000 * 60_000),
        ];
        let series = aggregate(ticks, &settings, 60_000).unwrap();

        let closes: Vec<f64> = series.iter().map(|c| c.close()).collect();
        assert_eq!(closes, vec![1.0, 1.0, 1.0, 2.0, 3.0]);
        assert_eq!(series[1].candle.volume, 0);
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate(Vec::new(), &AggregatorSettings::default(), 60_000).unwrap().is_empty());
    }
}
