//! Tick-to-candle aggregation.

use chartdesk_core::error::ConfigError;
use chartdesk_core::types::{AnnotatedCandle, Candle, Tick};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::pipeline::IndicatorPipeline;

/// Aggregator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorSettings {
    /// Candle width in milliseconds
    pub interval_ms: i64,
    /// Closed candles retained for indicators
    pub history_limit: usize,
    /// Candles in the published window, the open candle included
    pub display_limit: usize,
    /// Synthesize flat candles for buckets without ticks
    pub fill_gaps: bool,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            interval_ms: 60_000,
            history_limit: 100,
            display_limit: 50,
            fill_gaps: false,
        }
    }
}

impl AggregatorSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms <= 0 {
            return Err(ConfigError::OutOfRange {
                field: "interval_ms",
                expected: "greater than 0",
                value: self.interval_ms as f64,
            });
        }
        if self.display_limit == 0 {
            return Err(ConfigError::TooSmall {
                field: "display_limit",
                minimum: 1,
                value: 0,
            });
        }
        Ok(())
    }
}

/// Why a tick was not folded into a candle.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    #[error("tick bucket {bucket} is older than the latest bucket {latest}")]
    LateTick { bucket: i64, latest: i64 },

    #[error("tick price {0} is not a finite number")]
    NonFinitePrice(f64),
}

/// Effect of a single tick on the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// First candle opened (or first after a flush)
    Opened(Candle),
    /// Tick folded into the open candle
    Updated(Candle),
    /// Open candle closed and a new one opened
    Rolled {
        closed: AnnotatedCandle,
        gaps: usize,
        opened: Candle,
    },
    Rejected(RejectReason),
}

/// Folds ticks into fixed-width candles and annotates them as they close.
///
/// Owned by a single task; ticks are processed to completion one at a time.
/// Every close publishes the display window on a `watch` channel.
pub struct TickAggregator {
    settings: AggregatorSettings,
    current: Option<Candle>,
    pipeline: IndicatorPipeline,
    publisher: watch::Sender<Vec<AnnotatedCandle>>,
}

impl TickAggregator {
    pub fn new(settings: AggregatorSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let pipeline = IndicatorPipeline::new(settings.history_limit)?;
        let (publisher, _) = watch::channel(Vec::new());

        Ok(Self {
            settings,
            current: None,
            pipeline,
            publisher,
        })
    }

    /// Fold one tick into the candle history.
    pub fn push_tick(&mut self, tick: Tick) -> TickOutcome {
        if !tick.price.is_finite() {
            let reason = RejectReason::NonFinitePrice(tick.price);
            warn!(timestamp = tick.timestamp, %reason, "Rejected tick");
            return TickOutcome::Rejected(reason);
        }

        let bucket = tick.bucket(self.settings.interval_ms);

        if let Some(latest) = self.latest_bucket() {
            if bucket < latest || (self.current.is_none() && bucket == latest) {
                let reason = RejectReason::LateTick { bucket, latest };
                warn!(timestamp = tick.timestamp, price = tick.price, %reason, "Rejected tick");
                return TickOutcome::Rejected(reason);
            }
        }

        match self.current {
            Some(ref mut candle) if candle.bucket_start == bucket => {
                candle.absorb(tick.price);
                TickOutcome::Updated(*candle)
            }
            Some(candle) => {
                let closed = self.close(candle);
                let gaps = self.fill_gaps(bucket);
                let opened = Candle::from_first_tick(bucket, tick.price);
                self.current = Some(opened);
                self.publish();
                TickOutcome::Rolled {
                    closed,
                    gaps,
                    opened,
                }
            }
            None => {
                if self.fill_gaps(bucket) > 0 {
                    self.publish();
                }
                let opened = Candle::from_first_tick(bucket, tick.price);
                self.current = Some(opened);
                debug!(bucket, price = tick.price, "Opened candle");
                TickOutcome::Opened(opened)
            }
        }
    }

    /// Close the open candle once `now_ms` falls in a later bucket.
    ///
    /// Lets a timer close a candle whose bucket has ended when no further
    /// tick arrives.
    pub fn flush(&mut self, now_ms: i64) -> Option<AnnotatedCandle> {
        let candle = self.current?;
        let now_bucket = now_ms.div_euclid(self.settings.interval_ms) * self.settings.interval_ms;
        if now_bucket <= candle.bucket_start {
            return None;
        }

        self.current = None;
        let closed = self.close(candle);
        self.publish();
        Some(closed)
    }

    /// Current display window: the most recent closed candles followed by
    /// the provisionally annotated open candle.
    pub fn snapshot(&self) -> Vec<AnnotatedCandle> {
        let history = self.pipeline.history();
        let open = self.current.map(|c| self.pipeline.annotate_open(c));
        let closed_slots = self.settings.display_limit - usize::from(open.is_some());
        let skip = history.len().saturating_sub(closed_slots);

        history.iter().skip(skip).copied().chain(open).collect()
    }

    /// Receiver for the display window, updated on every candle close.
    pub fn subscribe(&self) -> watch::Receiver<Vec<AnnotatedCandle>> {
        self.publisher.subscribe()
    }

    /// Closed candles, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &AnnotatedCandle> {
        self.pipeline.history().iter()
    }

    /// The `n` most recently closed candles, oldest first.
    ///
    /// After a `Rolled { gaps, .. }` outcome, `recent(gaps + 1)` yields the
    /// closed candle followed by its gap fillers.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &AnnotatedCandle> {
        let history = self.pipeline.history();
        history.iter().skip(history.len().saturating_sub(n))
    }

    pub fn current(&self) -> Option<&Candle> {
        self.current.as_ref()
    }

    pub fn pipeline(&self) -> &IndicatorPipeline {
        &self.pipeline
    }

    pub fn settings(&self) -> &AggregatorSettings {
        &self.settings
    }

    fn latest_bucket(&self) -> Option<i64> {
        self.current
            .map(|c| c.bucket_start)
            .or_else(|| self.pipeline.last().map(|c| c.timestamp()))
    }

    fn close(&mut self, candle: Candle) -> AnnotatedCandle {
        let closed = self.pipeline.push_closed(candle);
        debug!(
            bucket = candle.bucket_start,
            open = candle.open,
            high = candle.high,
            low = candle.low,
            close = candle.close,
            volume = candle.volume,
            "Closed candle"
        );
        closed
    }

    /// Close flat candles for every empty bucket before `bucket`.
    ///
    /// A gap is only filled while the fillers and the candle before them fit
    /// in the history; wider jumps are logged and left as one transition.
    fn fill_gaps(&mut self, bucket: i64) -> usize {
        if !self.settings.fill_gaps {
            return 0;
        }
        let Some(last) = self.pipeline.last().map(|c| c.candle) else {
            return 0;
        };

        let interval = self.settings.interval_ms;
        let missing = (bucket - last.bucket_start) / interval - 1;
        if missing >= self.settings.history_limit as i64 {
            warn!(
                from = last.bucket_start + interval,
                to = bucket,
                missing,
                history_limit = self.settings.history_limit,
                "Gap too wide to fill"
            );
            return 0;
        }

        let mut filled = 0;
        let mut next = last.bucket_start + interval;
        while next < bucket {
            self.pipeline.push_closed(Candle::flat(next, last.close));
            next += interval;
            filled += 1;
        }

        if filled > 0 {
            debug!(from = last.bucket_start + interval, to = bucket, filled, "Filled empty buckets");
        }
        filled
    }

    fn publish(&self) {
        self.publisher.send_replace(self.snapshot());
    }
}
