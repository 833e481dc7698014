//! Built-in strategies.
//!
//! - SMA Crossover
//! - RSI Reversal
//! - MACD Momentum
//! - Bollinger Bounce
//!
//! Every strategy is a pure decision function over an annotated candle
//! series. Parameters arrive as a name to number map; missing names fall back
//! to the strategy defaults.

mod bollinger;
mod macd_strategy;
mod registry;
mod rsi_strategy;
mod sma_crossover;

pub use bollinger::BollingerBounce;
pub use macd_strategy::MacdMomentum;
pub use registry::{StrategyInfo, StrategyRegistry};
pub use rsi_strategy::RsiReversal;
pub use sma_crossover::SmaCrossover;

use chartdesk_core::error::StrategyError;
use chartdesk_core::traits::StrategyParameters;

/// Merge `overrides` into `defaults`, rejecting names the strategy does not
/// know.
pub(crate) fn merge_parameters(
    strategy: &str,
    defaults: &[(&str, f64)],
    overrides: &StrategyParameters,
) -> Result<StrategyParameters, StrategyError> {
    let mut parameters: StrategyParameters = defaults
        .iter()
        .map(|(name, value)| (name.to_string(), *value))
        .collect();

    for (name, value) in overrides {
        match parameters.get_mut(name) {
            Some(slot) => *slot = *value,
            None => {
                return Err(StrategyError::UnknownParameter {
                    strategy: strategy.to_string(),
                    name: name.clone(),
                })
            }
        }
    }

    Ok(parameters)
}

/// Longest lookback a strategy parameter may ask for.
pub const MAX_PERIOD: usize = 10_000;

/// Read a lookback period. `None` for values that are not whole numbers
/// between 1 and [`MAX_PERIOD`].
pub(crate) fn period(parameters: &StrategyParameters, name: &str, default: usize) -> Option<usize> {
    let value = parameters.get(name).copied().unwrap_or(default as f64);
    (value.is_finite() && (1.0..=MAX_PERIOD as f64).contains(&value) && value.fract() == 0.0)
        .then_some(value as usize)
}

pub(crate) fn value(parameters: &StrategyParameters, name: &str, default: f64) -> f64 {
    parameters.get(name).copied().unwrap_or(default)
}

pub(crate) fn require_period(
    parameters: &StrategyParameters,
    name: &str,
    minimum: usize,
) -> Result<usize, StrategyError> {
    match period(parameters, name, 0) {
        Some(p) if p >= minimum => Ok(p),
        _ => Err(StrategyError::InvalidParameter {
            name: name.to_string(),
            reason: format!("must be a whole number between {} and {}", minimum, MAX_PERIOD),
        }),
    }
}

pub(crate) fn require_finite(parameters: &StrategyParameters, name: &str) -> Result<f64, StrategyError> {
    match parameters.get(name) {
        Some(v) if v.is_finite() => Ok(*v),
        _ => Err(StrategyError::InvalidParameter {
            name: name.to_string(),
            reason: "must be a finite number".to_string(),
        }),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_parameters() {
        let mut overrides = StrategyParameters::new();
        overrides.insert("period".to_string(), 7.0);

        let merged = merge_parameters("x", &[("period", 14.0), ("level", 30.0)], &overrides).unwrap();
        assert_eq!(merged["period"], 7.0);
        assert_eq!(merged["level"], 30.0);

        overrides.insert("bogus".to_string(), 1.0);
        let err = merge_parameters("x", &[("period", 14.0)], &overrides).unwrap_err();
        assert!(matches!(err, StrategyError::UnknownParameter { .. }));
    }

    #[test]
    fn test_period_parsing() {
        let mut params = StrategyParameters::new();
        assert_eq!(period(&params, "p", 20), Some(20));

        params.insert("p".to_string(), 2.5);
        assert_eq!(period(&params, "p", 20), None);
        assert!(require_period(&params, "p", 1).is_err());

        params.insert("p".to_string(), 0.0);
        assert_eq!(period(&params, "p", 20), None);

        params.insert("p".to_string(), 5.0);
        assert_eq!(require_period(&params, "p", 2).unwrap(), 5);
    }

    #[test]
    fn test_period_upper_bound() {
        let mut params = StrategyParameters::new();
        params.insert("p".to_string(), MAX_PERIOD as f64);
        assert_eq!(require_period(&params, "p", 1).unwrap(), MAX_PERIOD);

        for huge in [MAX_PERIOD as f64 + 1.0, 1e20, f64::MAX] {
            params.insert("p".to_string(), huge);
            assert_eq!(period(&params, "p", 20), None);
            let err = require_period(&params, "p", 1).unwrap_err();
            assert!(matches!(err, StrategyError::InvalidParameter { .. }));
        }
    }
}
