//! Bollinger Bounce Strategy.
//!
//! Mean reversion on the bands: buy a close below the lower band, sell a
//! close above the upper band.

use chartdesk_core::{
    error::StrategyError,
    traits::{Strategy, StrategyParameters},
    types::{AnnotatedCandle, Decision},
};
use chartdesk_indicators::bollinger;

use crate::{merge_parameters, period, require_finite, require_period, value};

pub const ID: &str = "bollinger";
const PERIOD: &str = "period";
const STD_DEV: &str = "stdDev";
const DEFAULTS: [(&str, f64); 2] = [(PERIOD, 20.0), (STD_DEV, 2.0)];

#[derive(Debug, Clone)]
pub struct BollingerBounce {
    parameters: StrategyParameters,
}

impl BollingerBounce {
    pub fn with_parameters(overrides: &StrategyParameters) -> Result<Self, StrategyError> {
        let parameters = merge_parameters(ID, &DEFAULTS, overrides)?;
        require_period(&parameters, PERIOD, 2)?;
        if require_finite(&parameters, STD_DEV)? <= 0.0 {
            return Err(StrategyError::InvalidParameter {
                name: STD_DEV.to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(Self { parameters })
    }

    pub fn defaults() -> StrategyParameters {
        DEFAULTS.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }
}

impl Default for BollingerBounce {
    fn default() -> Self {
        Self {
            parameters: Self::defaults(),
        }
    }
}

impl Strategy for BollingerBounce {
    fn id(&self) -> &str {
        ID
    }

    fn name(&self) -> &str {
        "Bollinger Bounce"
    }

    fn description(&self) -> &str {
        "Buys below the lower band and sells above the upper band"
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
        let Some(period) = period(parameters, PERIOD, 20) else {
            return Decision::Hold;
        };
        let multiplier = value(parameters, STD_DEV, 2.0);
        let Some(closes) = self.recent_closes(series, index, period) else {
            return Decision::Hold;
        };
        let Some(bands) = bollinger(&closes, period, multiplier) else {
            return Decision::Hold;
        };

        let close = series[index].close();
        if close < bands.lower {
            Decision::Buy
        } else if close > bands.upper {
            Decision::Sell
        } else {
            Decision::Hold
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::series;

    fn with_last(last: f64) -> Vec<AnnotatedCandle> {
        let mut closes: Vec<f64> = (0..19).map(|i| 100.0 + (i % 3) as f64).collect();
        closes.push(last);
        series(&closes)
    }

    #[test]
    fn test_bounce_signals() {
        let strategy = BollingerBounce::default();
        let params = strategy.parameters();

        assert_eq!(strategy.signal(&with_last(80.0), 19, params), Decision::Buy);
        assert_eq!(strategy.signal(&with_last(125.0), 19, params), Decision::Sell);
        assert_eq!(strategy.signal(&with_last(101.0), 19, params), Decision::Hold);
    }

    #[test]
    fn test_flat_series_holds() {
        let strategy = BollingerBounce::default();
        let data = series(&[50.0; 25]);
        assert_eq!(strategy.signal(&data, 24, strategy.parameters()), Decision::Hold);
        assert_eq!(strategy.signal(&data, 10, strategy.parameters()), Decision::Hold);
    }

    #[test]
    fn test_invalid_std_dev() {
        let overrides = StrategyParameters::from([(STD_DEV.to_string(), 0.0)]);
        assert!(BollingerBounce::with_parameters(&overrides).is_err());
    }
}
