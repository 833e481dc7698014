//! RSI Reversal Strategy.
//!
//! Buys when RSI drops below the oversold level and sells when it rises
//! above the overbought level.

use chartdesk_core::{
    error::StrategyError,
    traits::{Strategy, StrategyParameters},
    types::{AnnotatedCandle, Decision},
};
use chartdesk_indicators::rsi;

use crate::{merge_parameters, period, require_finite, require_period, value};

pub const ID: &str = "rsi";
const PERIOD: &str = "period";
const OVERSOLD: &str = "oversold";
const OVERBOUGHT: &str = "overbought";
const DEFAULTS: [(&str, f64); 3] = [(PERIOD, 14.0), (OVERSOLD, 30.0), (OVERBOUGHT, 70.0)];

/// RSI-based reversal strategy.
#[derive(Debug, Clone)]
pub struct RsiReversal {
    parameters: StrategyParameters,
}

impl RsiReversal {
    pub fn with_parameters(overrides: &StrategyParameters) -> Result<Self, StrategyError> {
        let parameters = merge_parameters(ID, &DEFAULTS, overrides)?;
        require_period(&parameters, PERIOD, 1)?;
        let oversold = require_finite(&parameters, OVERSOLD)?;
        let overbought = require_finite(&parameters, OVERBOUGHT)?;

        if !(0.0..=100.0).contains(&oversold) || !(0.0..=100.0).contains(&overbought) {
            return Err(StrategyError::InvalidParameter {
                name: OVERSOLD.to_string(),
                reason: "levels must lie between 0 and 100".to_string(),
            });
        }
        if oversold >= overbought {
            return Err(StrategyError::InvalidParameter {
                name: OVERSOLD.to_string(),
                reason: format!("must be below {} ({})", OVERBOUGHT, overbought),
            });
        }

        Ok(Self { parameters })
    }

    pub fn defaults() -> StrategyParameters {
        DEFAULTS.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }
}

impl Default for RsiReversal {
    fn default() -> Self {
        Self {
            parameters: Self::defaults(),
        }
    }
}

impl Strategy for RsiReversal {
    fn id(&self) -> &str {
        ID
    }

    fn name(&self) -> &str {
        "RSI Reversal"
    }

    fn description(&self) -> &str {
        "Buys oversold and sells overbought RSI readings"
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
        let Some(period) = period(parameters, PERIOD, 14) else {
            return Decision::Hold;
        };
        let Some(reading) = period
            .checked_add(1)
            .and_then(|window| self.recent_closes(series, index, window))
            .and_then(|closes| rsi(&closes, period))
        else {
            return Decision::Hold;
        };

        if reading < value(parameters, OVERSOLD, 30.0) {
            Decision::Buy
        } else if reading > value(parameters, OVERBOUGHT, 70.0) {
            Decision::Sell
        } else {
            Decision::Hold
        }
    }
}
