//! MACD Momentum Strategy.

use chartdesk_core::{
    error::StrategyError,
    traits::{Strategy, StrategyParameters},
    types::{AnnotatedCandle, Decision},
};

use crate::merge_parameters;

pub const ID: &str = "macd";

/// Buys while the MACD line is above its signal line and sells while below.
///
/// Uses the MACD values the indicator pipeline already attached to each
/// candle, so the series must be annotated.
#[derive(Debug, Clone, Default)]
pub struct MacdMomentum {
    parameters: StrategyParameters,
}

impl MacdMomentum {
    pub fn with_parameters(overrides: &StrategyParameters) -> Result<Self, StrategyError> {
        Ok(Self {
            parameters: merge_parameters(ID, &[], overrides)?,
        })
    }
}

impl Strategy for MacdMomentum {
    fn id(&self) -> &str {
        ID
    }

    fn name(&self) -> &str {
        "MACD Momentum"
    }

    fn description(&self) -> &str {
        "Follows the MACD line relative to its signal line"
    }

    fn parameters(&self) -> &StrategyParameters {
        &self.parameters
    }

    fn signal(
        &self,
        series: &[AnnotatedCandle],
        index: usize,
        _parameters: &StrategyParameters,
    ) -> Decision {
        let Some(candle) = series.get(index) else {
            return Decision::Hold;
        };

        match (candle.macd, candle.macd_signal) {
            (Some(macd), Some(signal)) if macd > signal => Decision::Buy,
            (Some(macd), Some(signal)) if macd < signal => Decision::Sell,
            _ => Decision::Hold,
        }
    }
}
