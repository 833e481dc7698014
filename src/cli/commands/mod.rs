//! CLI command implementations.

pub mod backtest;
pub mod replay;
pub mod stream;
pub mod strategies;
pub mod validate;

use anyhow::{Context, Result};
use chartdesk_config::AppConfig;
use chartdesk_core::traits::{Strategy, StrategyParameters};
use chartdesk_core::types::{AnnotatedCandle, Decision};
use chartdesk_strategies::StrategyRegistry;
use std::sync::Arc;
use tracing::info;

use crate::cli::StrategyArgs;

/// Parse a `name=value` strategy parameter.
pub fn parse_parameter(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got \"{}\"", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in \"{}\"", raw));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("parameter {} must be a number, got \"{}\"", name, value.trim()))?;
    Ok((name.to_string(), value))
}

/// Build the selected strategy.
///
/// Configured parameters apply only when the configured strategy is the one
/// being built. Command-line overrides always win.
pub fn build_strategy(config: &AppConfig, args: &StrategyArgs) -> Result<Arc<dyn Strategy>> {
    let registry = StrategyRegistry::new();
    let id = args.strategy.as_deref().unwrap_or(&config.strategy.id);

    let info = registry
        .get(id)
        .with_context(|| format!("Unknown strategy '{}'. Available: {}", id, registry.ids().join(", ")))?;

    let mut overrides = StrategyParameters::new();
    if id == config.strategy.id {
        overrides.extend(config.strategy.resolve_parameters(&info.parameters));
    }
    overrides.extend(args.params.iter().cloned());

    let strategy = registry
        .create(id, &overrides)
        .with_context(|| format!("Failed to create strategy '{}'", id))?;
    info!(strategy = strategy.id(), parameters = ?strategy.parameters(), "Strategy ready");
    Ok(strategy)
}

/// Decision of `strategy` on the last candle of `series`.
pub fn latest_decision(strategy: &dyn Strategy, series: &[AnnotatedCandle]) -> Option<Decision> {
    let index = series.len().checked_sub(1)?;
    Some(strategy.signal(series, index, strategy.parameters()))
}

fn format_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

/// Render candles as a fixed-width table.
pub fn candle_table(candles: &[AnnotatedCandle]) -> String {
    let mut s = format!(
        "{:<20} {:>10} {:>10} {:>10} {:>10} {:>6} {:>10} {:>7} {:>8}\n",
        "time", "open", "high", "low", "close", "ticks", "sma20", "rsi", "macd"
    );
    s.push_str(&"─".repeat(99));
    s.push('\n');

    for c in candles {
        s.push_str(&format!(
            "{:<20} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>6} {:>10} {:>7} {:>8}\n",
            c.candle.datetime().format("%Y-%m-%d %H:%M:%S"),
            c.candle.open,
            c.candle.high,
            c.candle.low,
            c.candle.close,
            c.candle.volume,
            format_opt(c.sma20),
            format_opt(c.rsi),
            format_opt(c.macd),
        ));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartdesk_core::types::Candle;

    #[test]
    fn test_parse_parameter() {
        assert_eq!(parse_parameter("fastPeriod=10"), Ok(("fastPeriod".to_string(), 10.0)));
        assert_eq!(parse_parameter(" stdDev = 2.5 "), Ok(("stdDev".to_string(), 2.5)));
        assert!(parse_parameter("fastPeriod").is_err());
        assert!(parse_parameter("=3").is_err());
        assert!(parse_parameter("period=abc").is_err());
    }

    #[test]
    fn test_build_strategy_merges_overrides() {
        let mut config = AppConfig::default();
        config.strategy.parameters.insert("fastperiod".to_string(), 5.0);

        let args = StrategyArgs {
            strategy: None,
            params: vec![("slowPeriod".to_string(), 30.0)],
        };
        let strategy = build_strategy(&config, &args).unwrap();

        assert_eq!(strategy.id(), "sma_crossover");
        assert_eq!(strategy.parameters()["fastPeriod"], 5.0);
        assert_eq!(strategy.parameters()["slowPeriod"], 30.0);
    }

    #[test]
    fn test_build_strategy_unknown_id() {
        let args = StrategyArgs {
            strategy: Some("martingale".to_string()),
            params: Vec::new(),
        };
        let Err(error) = build_strategy(&AppConfig::default(), &args) else {
            panic!("expected an error for unknown strategy");
        };
        assert!(error.to_string().contains("Unknown strategy 'martingale'"));
    }

    #[test]
    fn test_candle_table() {
        let candles = vec![AnnotatedCandle::bare(Candle::new(0, 1.0, 2.0, 0.5, 1.5, 3))];
        let table = candle_table(&candles);

        assert_eq!(table.lines().count(), 3);
        assert!(table.contains("1970-01-01 00:00:00"));
        assert!(table.lines().nth(2).unwrap().trim_end().ends_with('-'));
        assert!(latest_decision(&chartdesk_strategies::MacdMomentum::default(), &candles).is_some());
        assert!(latest_decision(&chartdesk_strategies::MacdMomentum::default(), &[]).is_none());
    }
}
