//! OHLCV candle types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Time-bucketed OHLCV candle built from ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candle {
    /// Start of the time bucket, Unix milliseconds
    pub bucket_start: i64,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Number of ticks folded into the candle
    pub volume: u64,
}

impl Candle {
    /// Create a new candle.
    pub fn new(bucket_start: i64, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            bucket_start,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Open a candle from the first tick of a bucket.
    pub fn from_first_tick(bucket_start: i64, price: f64) -> Self {
        Self::new(bucket_start, price, price, price, price, 1)
    }

    /// Flat candle with no ticks, used to fill skipped buckets.
    pub fn flat(bucket_start: i64, price: f64) -> Self {
        Self::new(bucket_start, price, price, price, price, 0)
    }

    /// Fold another tick of the same bucket into the candle.
    #[inline]
    pub fn absorb(&mut self, price: f64) {
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
        self.volume += 1;
    }

    /// Calculate the candle's range (high - low).
    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Check if the candle is bullish (close > open).
    #[inline]
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Check the OHLC ordering invariant.
    pub fn is_consistent(&self) -> bool {
        self.low <= self.high
            && self.low <= self.open
            && self.low <= self.close
            && self.open <= self.high
            && self.close <= self.high
    }

    /// Get the bucket start as a DateTime.
    pub fn datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.bucket_start).unwrap_or_default()
    }
}

/// Candle plus the indicator values known at its close.
///
/// Every indicator field is `None` until enough history exists for its
/// lookback.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedCandle {
    #[serde(flatten)]
    pub candle: Candle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma20: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma50: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ema12: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ema26: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd_signal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd_histogram: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bollinger_upper: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bollinger_middle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bollinger_lower: Option<f64>,
}

impl AnnotatedCandle {
    /// Wrap a candle with no indicator values.
    pub fn bare(candle: Candle) -> Self {
        Self {
            candle,
            ..Default::default()
        }
    }

    #[inline]
    pub fn close(&self) -> f64 {
        self.candle.close
    }

    #[inline]
    pub fn timestamp(&self) -> i64 {
        self.candle.bucket_start
    }
}

impl From<Candle> for AnnotatedCandle {
    fn from(candle: Candle) -> Self {
        Self::bare(candle)
    }
}

impl Default for Candle {
    fn default() -> Self {
        Self::new(0, 0.0, 0.0, 0.0, 0.0, 0)
    }
}

/// Ordered candle history with optional bounded retention.
#[derive(Debug, Clone, Default)]
pub struct CandleSeries {
    candles: VecDeque<Candle>,
    /// Maximum capacity (0 = unlimited)
    capacity: usize,
}

impl CandleSeries {
    /// Create a new unbounded series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a series that keeps at most `capacity` candles.
    /// When capacity is reached, the oldest candles are evicted.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            candles: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a candle, returning the evicted candle if the series was full.
    pub fn push(&mut self, candle: Candle) -> Option<Candle> {
        let evicted = if self.capacity > 0 && self.candles.len() >= self.capacity {
            self.candles.pop_front()
        } else {
            None
        };
        self.candles.push_back(candle);
        evicted
    }

    /// Push multiple candles.
    pub fn extend(&mut self, candles: impl IntoIterator<Item = Candle>) {
        for candle in candles {
            self.push(candle);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the last candle.
    pub fn last(&self) -> Option<&Candle> {
        self.candles.back()
    }

    /// Get a candle by index (0 = oldest).
    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    /// Get the last N candles, oldest first.
    pub fn last_n(&self, n: usize) -> impl Iterator<Item = &Candle> {
        let start = self.candles.len().saturating_sub(n);
        self.candles.iter().skip(start)
    }

    /// Extract close prices.
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candle> {
        self.candles.iter()
    }

    pub fn clear(&mut self) {
        self.candles.clear();
    }
}

impl FromIterator<Candle> for CandleSeries {
    fn from_iter<T: IntoIterator<Item = Candle>>(iter: T) -> Self {
        Self {
            candles: iter.into_iter().collect(),
            capacity: 0,
        }
    }
}
