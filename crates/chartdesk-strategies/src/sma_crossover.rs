//! SMA Crossover Strategy.
//!
//! Long while the fast SMA sits above the slow SMA, flat while below. The
//! decision follows the state of the two averages rather than the crossing
//! bar, so a series that trends from its first candle still gets an entry.

use chartdesk_core::{
    error::StrategyError,
    traits::{Strategy, StrategyParameters},
    types::{AnnotatedCandle, Decision},
};
use chartdesk_indicators::sma;

use crate::{merge_parameters, period, require_period};

pub const ID: &str = "sma_crossover";
const FAST: &str = "fastPeriod";
const SLOW: &str = "slowPeriod";
const DEFAULTS: [(&str, f64); 2] = [(FAST, 20.0), (SLOW, 50.0)];

/// SMA Crossover Strategy.
#[derive(Debug, Clone)]
pub struct SmaCrossover {
    parameters: StrategyParameters,
}

impl SmaCrossover {
    /// Build with `overrides` applied to the defaults (20, 50).
    pub fn with_parameters(overrides: &StrategyParameters) -> Result<Self, StrategyError> {
        let parameters = merge_parameters(ID, &DEFAULTS, overrides)?;
        let fast = require_period(&parameters, FAST, 1)?;
        let slow = require_period(&parameters, SLOW, 1)?;
        if fast >= slow {
            return Err(StrategyError::InvalidParameter {
                name: FAST.to_string(),
                reason: format!("must be less than {} ({})", SLOW, slow),
            });
        }
        Ok(Self { parameters })
    }

    pub fn new(fast: usize, slow: usize) -> Result<Self, StrategyError> {
        let overrides = StrategyParameters::from([
            (FAST.to_string(), fast as f64),
            (SLOW.to_string(), slow as f64),
        ]);
        Self::with_parameters(&overrides)
    }

    pub fn defaults() -> StrategyParameters {
        DEFAULTS.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }
}

impl Default for SmaCrossover {
    fn default() -> Self {
        Self {
            parameters: Self::defaults(),
        }
    }
}

impl Strategy for SmaCrossover {
    fn id(&self) -> &str {
        ID
    }

    fn name(&self) -> &str {
        "SMA Crossover"
    }

    fn description(&self) -> &str {
        "Long while the fast SMA is above the slow SMA"
    }

    fn parameters(&self) -> &StrategyParameters {
        &self.parameters
    }

    fn signal(
        &self,
        series: &[AnnotatedCandle],
        index: usize,
        parameters: &StrategyParameters,
    ) -> Decision {
        let (Some(fast), Some(slow)) = (period(parameters, FAST, 20), period(parameters, SLOW, 50)) else {
            return Decision::Hold;
        };
        let Some(closes) = self.recent_closes(series, index, fast.max(slow)) else {
            return Decision::Hold;
        };

        match (sma(&closes, fast), sma(&closes, slow)) {
            (Some(f), Some(s)) if f > s => Decision::Buy,
            (Some(f), Some(s)) if f < s => Decision::Sell,
            _ => Decision::Hold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::series;

    #[test]
    fn test_holds_during_warmup() {
        let strategy = SmaCrossover::default();
        let data = series(&(0..60).map(|i| 100.0 + i as f64).collect::<Vec<_>>());

        assert_eq!(strategy.signal(&data, 48, strategy.parameters()), Decision::Hold);
        assert_eq!(strategy.signal(&data, 49, strategy.parameters()), Decision::Buy);
    }

    #[test]
    fn test_sell_in_downtrend() {
        let strategy = SmaCrossover::new(3, 5).unwrap();
        let data = series(&[10.0, 9.0, 8.0, 7.0, 6.0, 5.0]);
        assert_eq!(strategy.signal(&data, 5, strategy.parameters()), Decision::Sell);
    }

    #[test]
    fn test_equal_averages_hold() {
        let strategy = SmaCrossover::new(2, 4).unwrap();
        let data = series(&[5.0; 6]);
        assert_eq!(strategy.signal(&data, 5, strategy.parameters()), Decision::Hold);
    }

    #[test]
    fn test_passed_parameters_win() {
        let strategy = SmaCrossover::default();
        let data = series(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        let params = StrategyParameters::from([(FAST.to_string(), 2.0), (SLOW.to_string(), 4.0)]);
        assert_eq!(strategy.signal(&data, 4, &params), Decision::Buy);
        assert_eq!(strategy.signal(&data, 4, strategy.parameters()), Decision::Hold);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(SmaCrossover::new(50, 20).is_err());
        assert!(SmaCrossover::new(0, 20).is_err());

        let unknown = StrategyParameters::from([("lookback".to_string(), 3.0)]);
        assert!(matches!(
            SmaCrossover::with_parameters(&unknown),
            Err(StrategyError::UnknownParameter { .. })
        ));

        let huge = StrategyParameters::from([(SLOW.to_string(), 1e20)]);
        assert!(matches!(
            SmaCrossover::with_parameters(&huge),
            Err(StrategyError::InvalidParameter { .. })
        ));
    }
}
