//! Volatility indicators.

use chartdesk_core::traits::{Indicator, MultiOutputIndicator};
use serde::{Deserialize, Serialize};

use crate::moving_average::mean;

/// Population standard deviation of one window.
fn std_dev_window(window: &[f64]) -> f64 {
    let mean = mean(window);
    let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / window.len() as f64;
    variance.sqrt()
}

fn bands_window(window: &[f64], multiplier: f64) -> BollingerOutput {
    let middle = mean(window);
    let band = multiplier * std_dev_window(window);
    BollingerOutput {
        upper: middle + band,
        middle,
        lower: middle - band,
    }
}

/// Bollinger Bands of the latest `period` prices.
pub fn bollinger(prices: &[f64], period: usize, multiplier: f64) -> Option<BollingerOutput> {
    if period == 0 || prices.len() < period {
        return None;
    }
    Some(bands_window(&prices[prices.len() - period..], multiplier))
}

/// Standard Deviation (population).
#[derive(Debug, Clone)]
pub struct StdDev {
    period: usize,
}

impl StdDev {
    /// Create a new standard deviation indicator.
    pub fn new(period: usize) -> Self {
        assert!(period > 1, "Period must be greater than 1");
        Self { period }
    }
}

impl Indicator for StdDev {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() < self.period {
            return vec![];
        }
        data.windows(self.period).map(std_dev_window).collect()
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "StdDev"
    }
}

/// Bollinger Bands output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerOutput {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerOutput {
    /// Band width relative to the middle band.
    pub fn width(&self) -> f64 {
        if self.middle == 0.0 {
            0.0
        } else {
            (self.upper - self.lower) / self.middle
        }
    }
}

/// Bollinger Bands.
///
/// Middle band is the SMA, outer bands sit `multiplier` standard deviations
/// away from it.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    period: usize,
    multiplier: f64,
}

impl BollingerBands {
    /// Create new Bollinger Bands. Common settings are (20, 2.0).
    pub fn new(period: usize, multiplier: f64) -> Self {
        assert!(period > 1, "Period must be greater than 1");
        assert!(multiplier >= 0.0, "Multiplier must be non-negative");
        Self { period, multiplier }
    }
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self::new(crate::periods::BOLLINGER, crate::periods::BOLLINGER_MULTIPLIER)
    }
}

impl MultiOutputIndicator for BollingerBands {
    type Outputs = BollingerOutput;

    fn calculate(&self, data: &[f64]) -> Vec<BollingerOutput> {
        if data.len() < self.period {
            return vec![];
        }
        data.windows(self.period)
            .map(|w| bands_window(w, self.multiplier))
            .collect()
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "BollingerBands"
    }
}
