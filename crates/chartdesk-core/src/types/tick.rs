//! Raw price ticks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single price observation from a market-data feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Traded or quoted price
    pub price: f64,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
}

impl Tick {
    pub fn new(price: f64, timestamp: i64) -> Self {
        Self { price, timestamp }
    }

    /// Start of the time bucket this tick falls into.
    ///
    /// Uses floor division so ticks before the epoch land in the bucket
    /// that contains them rather than the one after.
    #[inline]
    pub fn bucket(&self, interval_ms: i64) -> i64 {
        self.timestamp.div_euclid(interval_ms) * interval_ms
    }

    /// Get the timestamp as a DateTime.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}
