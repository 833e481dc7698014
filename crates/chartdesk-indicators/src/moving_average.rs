//! Moving average indicators.

use chartdesk_core::traits::Indicator;

#[inline]
pub(crate) fn mean(window: &[f64]) -> f64 {
    window.iter().sum::<f64>() / window.len() as f64
}

/// Smoothing factor for an EMA of the given period.
#[inline]
pub fn ema_multiplier(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

/// Arithmetic mean of the last `period` prices.
///
/// Returns `None` while fewer than `period` prices exist.
pub fn sma(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }
    Some(mean(&prices[prices.len() - period..]))
}

/// Exponential moving average of the latest price.
///
/// Without a `previous` value the EMA is seeded with [`sma`]. With one, the
/// recurrence `price * k + previous * (1 - k)` is applied to the last price
/// only, so callers must feed every price in order to stay on the canonical
/// value.
pub fn ema(prices: &[f64], period: usize, previous: Option<f64>) -> Option<f64> {
    match previous {
        None => sma(prices, period),
        Some(prev) => {
            let price = *prices.last()?;
            let k = ema_multiplier(period);
            Some(price * k + prev * (1.0 - k))
        }
    }
}

/// Simple Moving Average (SMA).
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() < self.period {
            return vec![];
        }
        data.windows(self.period).map(mean).collect()
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

/// Exponential Moving Average (EMA), seeded with the SMA of the first
/// `period` prices.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
}

impl Ema {
    /// Create a new EMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() < self.period {
            return vec![];
        }

        let mut result = Vec::with_capacity(data.len() - self.period + 1);
        let mut current = mean(&data[..self.period]);
        result.push(current);

        for end in self.period + 1..=data.len() {
            // Same recurrence as the point function, one price at a time
            if let Some(next) = ema(&data[..end], self.period, Some(current)) {
                current = next;
                result.push(current);
            }
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "EMA"
    }
}
