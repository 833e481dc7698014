//! Momentum indicators.

use chartdesk_core::traits::{Indicator, MultiOutputIndicator};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::moving_average::{ema, mean, Ema};

/// RSI over one window of `period + 1` prices, using simple averages of
/// the gains and losses.
fn rsi_window(window: &[f64]) -> f64 {
    let deltas = window.len() - 1;
    let (mut gains, mut losses) = (0.0, 0.0);

    for pair in window.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gains += change;
        } else {
            losses -= change;
        }
    }

    let avg_gain = gains / deltas as f64;
    let avg_loss = losses / deltas as f64;

    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

/// Relative Strength Index of the latest price.
///
/// Returns `None` while fewer than `period + 1` prices exist. When the
/// window has no losses the RSI is 100.
pub fn rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || period.checked_add(1).map_or(true, |needed| prices.len() < needed) {
        return None;
    }
    Some(rsi_window(&prices[prices.len() - period - 1..]))
}

/// Relative Strength Index (RSI), simple-average flavour.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    /// Create a new RSI indicator. Common period is 14.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Default for Rsi {
    fn default() -> Self {
        Self::new(crate::periods::RSI)
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() <= self.period {
            return vec![];
        }
        data.windows(self.period + 1).map(rsi_window).collect()
    }

    fn period(&self) -> usize {
        self.period.saturating_add(1) // Need period+1 data points
    }

    fn name(&self) -> &str {
        "RSI"
    }
}

/// MACD periods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: crate::periods::EMA_FAST,
            slow: crate::periods::EMA_SLOW,
            signal: crate::periods::MACD_SIGNAL,
        }
    }
}

/// MACD (Moving Average Convergence Divergence) output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdOutput {
    /// MACD line (fast EMA - slow EMA)
    pub macd: f64,
    /// Signal line (mean of the recent MACD values)
    pub signal: f64,
    /// Histogram (MACD - Signal)
    pub histogram: f64,
}

/// Result of one incremental MACD step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MacdStep {
    /// Fast EMA after this price, to carry into the next call
    pub fast_ema: Option<f64>,
    /// Slow EMA after this price, to carry into the next call
    pub slow_ema: Option<f64>,
    pub output: Option<MacdOutput>,
}

/// Advance MACD by the latest price.
///
/// `previous_fast`/`previous_slow` are the EMAs carried from the previous
/// price. Once both EMAs exist the new MACD value is appended to `history`,
/// which keeps at most `params.signal` values; the signal line is the mean
/// of that history.
pub fn macd(
    prices: &[f64],
    params: MacdParams,
    previous_fast: Option<f64>,
    previous_slow: Option<f64>,
    history: &mut VecDeque<f64>,
) -> MacdStep {
    let fast_ema = ema(prices, params.fast, previous_fast);
    let slow_ema = ema(prices, params.slow, previous_slow);

    let output = match (fast_ema, slow_ema) {
        (Some(fast), Some(slow)) => {
            let value = fast - slow;
            history.push_back(value);
            while history.len() > params.signal {
                history.pop_front();
            }
            let (head, tail) = history.as_slices();
            let signal = (head.iter().sum::<f64>() + tail.iter().sum::<f64>()) / history.len() as f64;
            Some(MacdOutput {
                macd: value,
                signal,
                histogram: value - signal,
            })
        }
        _ => None,
    };

    MacdStep {
        fast_ema,
        slow_ema,
        output,
    }
}

/// Batch MACD indicator.
#[derive(Debug, Clone)]
pub struct Macd {
    params: MacdParams,
}

impl Macd {
    /// Create a new MACD with default parameters (12, 26, 9).
    pub fn new() -> Self {
        Self::with_params(MacdParams::default())
    }

    /// Create a MACD with custom periods.
    pub fn with_params(params: MacdParams) -> Self {
        assert!(params.fast > 0 && params.slow > 0 && params.signal > 0);
        assert!(params.fast < params.slow, "Fast period must be less than slow period");
        Self { params }
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiOutputIndicator for Macd {
    type Outputs = MacdOutput;

    /// One output per price from index `slow - 1` on. The signal line
    /// averages the MACD values available so far, up to `signal` of them.
    fn calculate(&self, data: &[f64]) -> Vec<MacdOutput> {
        if data.len() < self.params.slow {
            return vec![];
        }

        let fast_ema = Ema::new(self.params.fast).calculate(data);
        let slow_ema = Ema::new(self.params.slow).calculate(data);

        // Align the EMAs (fast has more values)
        let offset = self.params.slow - self.params.fast;
        let macd_line: Vec<f64> = fast_ema[offset..]
            .iter()
            .zip(slow_ema.iter())
            .map(|(f, s)| f - s)
            .collect();

        macd_line
            .iter()
            .enumerate()
            .map(|(i, &value)| {
                let start = (i + 1).saturating_sub(self.params.signal);
                let signal = mean(&macd_line[start..=i]);
                MacdOutput {
                    macd: value,
                    signal,
                    histogram: value - signal,
                }
            })
            .collect()
    }

    fn period(&self) -> usize {
        self.params.slow
    }

    fn name(&self) -> &str {
        "MACD"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_bounds() {
        let data: Vec<f64> = (0..30)
            .map(|i| 100.0 + (i as f64 * 0.5).sin() * 5.0)
            .collect();

        let result = Rsi::new(14).calculate(&data);
        assert_eq!(result.len(), 30 - 14);

        for value in &result {
            assert!(*value >= 0.0 && *value <= 100.0);
        }
        assert_eq!(rsi(&data, 14), result.last().copied());
    }

    #[test]
    fn test_rsi_all_gains_and_losses() {
        let up = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        assert!((rsi(&up, 5).unwrap() - 100.0).abs() < 1e-10);

        let down = vec![7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0];
        assert!(rsi(&down, 5).unwrap().abs() < 1e-10);
    }

    #[test]
    fn test_rsi_simple_average() {
        // Deltas: +2, -1, +1, -2 -> avg gain 0.75, avg loss 0.75
        let data = vec![10.0, 12.0, 11.0, 12.0, 10.0];
        assert!((rsi(&data, 4).unwrap() - 50.0).abs() < 1e-10);
    }

    #[test]
    fn test_rsi_warmup() {
        let data = vec![1.0; 14];
        assert_eq!(rsi(&data, 14), None);
        assert_eq!(rsi(&[1.0; 15], 14), Some(100.0));
        assert_eq!(rsi(&data, usize::MAX), None);
    }

    #[test]
    fn test_macd_incremental_matches_batch() {
        let params = MacdParams { fast: 3, slow: 6, signal: 4 };
        let data: Vec<f64> = (0..25).map(|i| 50.0 + (i as f64 * 0.7).cos() * 3.0).collect();

        let batch = Macd::with_params(params).calculate(&data);
        assert_eq!(batch.len(), data.len() - params.slow + 1);

        let mut history = VecDeque::new();
        let (mut fast, mut slow) = (None, None);
        let mut incremental = Vec::new();
        for end in 1..=data.len() {
            let step = macd(&data[..end], params, fast, slow, &mut history);
            fast = step.fast_ema;
            slow = step.slow_ema;
            incremental.extend(step.output);
            assert!(history.len() <= params.signal);
        }

        assert_eq!(incremental.len(), batch.len());
        for (a, b) in incremental.iter().zip(batch.iter()) {
            assert!((a.macd - b.macd).abs() < 1e-9);
            assert!((a.signal - b.signal).abs() < 1e-9);
            assert!((a.histogram - b.histogram).abs() < 1e-9);
        }
    }

    #[test]
    fn test_macd_uptrend_positive() {
        let data: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        let result = Macd::new().calculate(&data);
        assert!(result.last().unwrap().macd > 0.0);
    }

    #[test]
    fn test_macd_undefined_until_slow_ema() {
        let data: Vec<f64> = (0..25).map(|i| i as f64).collect();
        let mut history = VecDeque::new();
        let step = macd(&data, MacdParams::default(), None, None, &mut history);

        assert!(step.fast_ema.is_some());
        assert!(step.slow_ema.is_none());
        assert!(step.output.is_none());
        assert!(history.is_empty());
    }
}
