//! CSV candle and tick sources.

use chartdesk_core::error::DataError;
use chartdesk_core::types::{Candle, Tick};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Candle CSV record format.
#[derive(Debug, Deserialize)]
struct CandleRecord {
    #[serde(alias = "Date", alias = "date", alias = "Timestamp", alias = "time")]
    timestamp: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close", alias = "Adj Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: f64,
}

/// Tick CSV record format.
#[derive(Debug, Deserialize)]
struct TickRecord {
    #[serde(alias = "Timestamp", alias = "time", alias = "epoch")]
    timestamp: String,
    #[serde(alias = "Price", alias = "quote")]
    price: f64,
}

/// CSV file holding either candles or ticks.
pub struct CsvDataSource {
    path: PathBuf,
}

impl CsvDataSource {
    /// Create a new CSV data source.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::NotFound(path.display().to_string()));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load candles (`timestamp,open,high,low,close[,volume]`), sorted by time.
    pub fn load_candles(&self) -> Result<Vec<Candle>, DataError> {
        let mut candles = Vec::new();

        for result in self.reader()?.deserialize() {
            let record: CandleRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;
            let candle = Candle::new(
                parse_timestamp(&record.timestamp)?,
                record.open,
                record.high,
                record.low,
                record.close,
                record.volume.max(0.0).round() as u64,
            );
            if !candle.is_consistent() {
                return Err(DataError::ParseError(format!(
                    "Inconsistent OHLC at {}",
                    record.timestamp
                )));
            }
            candles.push(candle);
        }

        candles.sort_by_key(|c| c.bucket_start);
        debug!(path = %self.path.display(), count = candles.len(), "Loaded candles");

        if candles.is_empty() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(candles)
    }

    /// Load ticks (`timestamp,price`), sorted by time.
    pub fn load_ticks(&self) -> Result<Vec<Tick>, DataError> {
        let mut ticks = Vec::new();

        for result in self.reader()?.deserialize() {
            let record: TickRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;
            ticks.push(Tick::new(record.price, parse_timestamp(&record.timestamp)?));
        }

        // Stable, so equal timestamps keep file order
        ticks.sort_by_key(|t| t.timestamp);
        debug!(path = %self.path.display(), count = ticks.len(), "Loaded ticks");

        if ticks.is_empty() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(ticks)
    }

    fn reader(&self) -> Result<csv::Reader<std::fs::File>, DataError> {
        ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| DataError::ParseError(e.to_string()))
    }
}

/// Parse various timestamp formats into Unix milliseconds.
pub fn parse_timestamp(date_str: &str) -> Result<i64, DataError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Ok(dt.timestamp_millis());
    }

    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%m/%d/%Y",
        "%d-%m-%Y",
    ];

    for format in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
        if let Some(dt) = NaiveDate::parse_from_str(date_str, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }

    // Try parsing as Unix timestamp
    if let Ok(ts) = date_str.parse::<i64>() {
        // Assume milliseconds if > 10 digits
        if ts.abs() > 10_000_000_000 {
            return Ok(ts);
        }
        return Ok(ts * 1000);
    }

    Err(DataError::ParseError(format!(
        "Could not parse date: {}",
        date_str
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("chartdesk-{}-{}.csv", name, std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("1970-01-02").unwrap(), 86_400_000);
        assert_eq!(parse_timestamp("1970-01-01 00:01:00").unwrap(), 60_000);
        assert_eq!(parse_timestamp("1970-01-01T00:00:01Z").unwrap(), 1_000);
        assert_eq!(parse_timestamp("1705312800000").unwrap(), 1_705_312_800_000); // Unix ms
        assert_eq!(parse_timestamp("1705312800").unwrap(), 1_705_312_800_000); // Unix sec
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_load_candles_sorted() {
        let path = write_temp(
            "candles",
            "timestamp,open,high,low,close,volume\n\
             120000,3,4,2,3.5,7\n\
             60000,1,2,0.5,1.5,3\n",
        );

        let candles = CsvDataSource::new(&path).unwrap().load_candles().unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].bucket_start, 60_000_000);
        assert_eq!(candles[0].volume, 3);
        assert_eq!(candles[1].close, 3.5);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_candles_rejects_inconsistent_row() {
        let path = write_temp("bad-candles", "timestamp,open,high,low,close\n2024-01-01,5,4,3,4\n");
        let err = CsvDataSource::new(&path).unwrap().load_candles().unwrap_err();
        assert!(matches!(err, DataError::ParseError(_)));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_ticks() {
        let path = write_temp(
            "ticks",
            "timestamp,price\n\
             1970-01-01 00:00:30,2.0\n\
             1970-01-01 00:00:00,1.0\n",
        );

        let ticks = CsvDataSource::new(&path).unwrap().load_ticks().unwrap();
        assert_eq!(ticks, vec![Tick::new(1.0, 0), Tick::new(2.0, 30_000)]);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            CsvDataSource::new("/definitely/not/here.csv"),
            Err(DataError::NotFound(_))
        ));
    }
}
