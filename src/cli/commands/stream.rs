//! Stream command implementation.

use anyhow::{Context, Result};
use chartdesk_config::AppConfig;
use chartdesk_core::traits::TickSource;
use chartdesk_core::types::{AnnotatedCandle, Tick};
use chartdesk_data::{AggregatorSettings, TickAggregator, TickOutcome};
use chartdesk_feed::{FeedClient, FeedSettings};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

use super::{build_strategy, candle_table, latest_decision};
use crate::cli::StreamArgs;

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// The feed's clock, estimated from the offset of the latest live tick.
///
/// Delivery latency makes the estimate lag, so a flush may come late but
/// never early.
#[derive(Debug, Default)]
struct FeedClock {
    offset_ms: Option<i64>,
}

impl FeedClock {
    fn observe(&mut self, tick_ms: i64, local_ms: i64) {
        self.offset_ms = Some(tick_ms.saturating_sub(local_ms));
    }

    /// Feed time at `local_ms`, once a live tick has been seen.
    fn at(&self, local_ms: i64) -> Option<i64> {
        self.offset_ms.map(|offset| local_ms.saturating_add(offset))
    }
}

pub async fn run(args: StreamArgs, config: &AppConfig) -> Result<()> {
    let strategy = build_strategy(config, &args.strategy)?;
    let symbol = args.symbol.clone().unwrap_or_else(|| config.app.symbol.clone());

    let feed_settings = FeedSettings {
        url: args.url.clone().unwrap_or_else(|| config.feed.url.clone()),
        ..config.feed.clone()
    };
    let mut client = FeedClient::new(feed_settings).context("Invalid feed settings")?;

    let settings = AggregatorSettings {
        interval_ms: args
            .timeframe
            .map(|t| t.as_millis())
            .unwrap_or(config.aggregator.interval_ms),
        ..config.aggregator.clone()
    };
    let interval_ms = settings.interval_ms;
    let mut aggregator = TickAggregator::new(settings).context("Invalid aggregator settings")?;

    let mut ticks = client.subscribe(&symbol).await?;
    info!(symbol = %symbol, url = %client.settings().url, "Streaming ticks");

    let mut closed_count = 0usize;
    let mut on_closed = |aggregator: &TickAggregator, closed: &AnnotatedCandle| {
        closed_count += 1;
        let history: Vec<_> = aggregator.history().copied().collect();
        info!(
            symbol = %symbol,
            time = %closed.candle.datetime(),
            open = closed.candle.open,
            high = closed.candle.high,
            low = closed.candle.low,
            close = closed.close(),
            ticks = closed.candle.volume,
            rsi = ?closed.rsi,
            decision = ?latest_decision(strategy.as_ref(), &history),
            "Candle closed"
        );
        closed_count
    };

    if args.history > 0 {
        if let Some(handle) = client.handle() {
            match handle.tick_history(&symbol, args.history).await {
                Ok(history) => {
                    info!(ticks = history.len(), "Seeding candles from tick history");
                    for tick in history {
                        if let TickOutcome::Rolled { closed, .. } = aggregator.push_tick(tick) {
                            on_closed(&aggregator, &closed);
                        }
                    }
                }
                Err(e) => warn!(error = %e, "Tick history unavailable, starting empty"),
            }
        }
    }

    // Close candles on time even when ticks stall
    let mut timer = tokio::time::interval(Duration::from_millis(interval_ms.max(1) as u64));
    timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut clock = FeedClock::default();

    loop {
        let closed = tokio::select! {
            tick = ticks.recv() => match tick {
                Some(tick) => {
                    clock.observe(tick.timestamp, now_ms());
                    push(&mut aggregator, tick)
                }
                None => {
                    warn!(symbol = %symbol, "Feed closed");
                    break;
                }
            },
            _ = timer.tick() => clock.at(now_ms()).and_then(|feed_now| aggregator.flush(feed_now)),
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        };

        if let Some(closed) = closed {
            let count = on_closed(&aggregator, &closed);
            if args.max_candles.is_some_and(|max| count >= max) {
                info!(candles = count, "Candle limit reached");
                break;
            }
        }
    }

    client.shutdown();
    println!("{}", candle_table(&aggregator.snapshot()));
    Ok(())
}

fn push(aggregator: &mut TickAggregator, tick: Tick) -> Option<AnnotatedCandle> {
    match aggregator.push_tick(tick) {
        TickOutcome::Rolled { closed, .. } => Some(closed),
        _ => None,
    }
}
