//! Candle interval definitions.

use crate::error::DataError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const SECOND: i64 = 1_000;
const MINUTE: i64 = 60 * SECOND;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// Fixed-width candle interval, written like `15s`, `1m`, `4h` or `1d`.
///
/// Any whole number of seconds, minutes, hours or days is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timeframe {
    millis: i64,
}

impl Timeframe {
    pub const SECOND: Timeframe = Timeframe { millis: SECOND };
    pub const MINUTE: Timeframe = Timeframe { millis: MINUTE };
    pub const FIVE_MINUTES: Timeframe = Timeframe { millis: 5 * MINUTE };
    pub const HOUR: Timeframe = Timeframe { millis: HOUR };
    pub const DAY: Timeframe = Timeframe { millis: DAY };

    /// Interval of `millis` milliseconds, if it is a positive whole number of seconds.
    pub fn from_millis(millis: i64) -> Option<Self> {
        (millis > 0 && millis % SECOND == 0).then_some(Self { millis })
    }

    pub fn as_millis(&self) -> i64 {
        self.millis
    }

    pub fn as_secs(&self) -> i64 {
        self.millis / SECOND
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Timeframe::MINUTE
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Largest unit that divides the interval exactly
        let (count, unit) = [(DAY, "d"), (HOUR, "h"), (MINUTE, "m")]
            .into_iter()
            .find(|(size, _)| self.millis % size == 0)
            .map(|(size, unit)| (self.millis / size, unit))
            .unwrap_or((self.millis / SECOND, "s"));
        write!(f, "{}{}", count, unit)
    }
}

impl FromStr for Timeframe {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DataError::InvalidTimeframe(s.to_string());
        let trimmed = s.trim();

        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (count, unit) = trimmed.split_at(split);
        let count: i64 = count.parse().map_err(|_| invalid())?;

        let unit_millis = match unit.to_lowercase().as_str() {
            "s" | "sec" | "second" | "seconds" => SECOND,
            "m" | "min" | "minute" | "minutes" => MINUTE,
            "h" | "hour" | "hours" => HOUR,
            "d" | "day" | "days" => DAY,
            _ => return Err(invalid()),
        };

        count
            .checked_mul(unit_millis)
            .and_then(Timeframe::from_millis)
            .ok_or_else(invalid)
    }
}

impl TryFrom<String> for Timeframe {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timeframe> for String {
    fn from(timeframe: Timeframe) -> Self {
        timeframe.to_string()
    }
}
