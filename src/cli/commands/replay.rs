//! Replay command implementation.

use anyhow::{Context, Result};
use chartdesk_config::AppConfig;
use chartdesk_core::traits::TickSource;
use chartdesk_data::synthetic::random_ticks;
use chartdesk_data::{load_ticks, AggregatorSettings, ReplaySource, TickAggregator, TickOutcome};
use std::time::Duration;
use tracing::{debug, info};

use super::{build_strategy, candle_table, latest_decision};
use crate::cli::ReplayArgs;

pub async fn run(args: ReplayArgs, config: &AppConfig) -> Result<()> {
    let strategy = build_strategy(config, &args.strategy)?;

    let ticks = match &args.ticks {
        Some(path) => load_ticks(path).with_context(|| format!("Failed to load ticks from {}", path.display()))?,
        None => random_ticks(args.count, 100.0, 0, args.spacing_ms, args.seed),
    };

    let settings = AggregatorSettings {
        interval_ms: args
            .timeframe
            .map(|t| t.as_millis())
            .unwrap_or(config.aggregator.interval_ms),
        ..config.aggregator.clone()
    };
    let mut aggregator = TickAggregator::new(settings).context("Invalid aggregator settings")?;

    // Count published windows the way a chart would consume them
    let mut window = aggregator.subscribe();
    let watcher = tokio::spawn(async move {
        let mut published = 0usize;
        while window.changed().await.is_ok() {
            published += 1;
            debug!(candles = window.borrow_and_update().len(), "Window published");
        }
        published
    });

    let mut source = ReplaySource::new(ticks);
    if let Some(pace) = args.pace_ms {
        source = source.with_pace(Duration::from_millis(pace));
    }
    let mut receiver = source.subscribe("replay").await?;

    let mut processed = 0usize;
    let mut rejected = 0usize;
    let mut closed_count = 0usize;
    while let Some(tick) = receiver.recv().await {
        processed += 1;
        match aggregator.push_tick(tick) {
            TickOutcome::Rolled { closed, gaps, .. } => {
                closed_count += 1 + gaps;
                let history: Vec<_> = aggregator.history().copied().collect();
                info!(
                    time = %closed.candle.datetime(),
                    close = closed.close(),
                    gaps,
                    decision = ?latest_decision(strategy.as_ref(), &history),
                    "Candle closed"
                );
            }
            TickOutcome::Rejected(_) => rejected += 1,
            TickOutcome::Opened(_) | TickOutcome::Updated(_) => {}
        }
    }

    let snapshot = aggregator.snapshot();
    let history: Vec<_> = aggregator.history().copied().collect();
    let decision = latest_decision(strategy.as_ref(), &history);
    drop(aggregator);
    let published = watcher.await.unwrap_or_default();

    info!(processed, rejected, closed = closed_count, published, "Replay finished");

    let rows = snapshot.len().saturating_sub(args.rows);
    println!("{}", candle_table(&snapshot[rows..]));
    println!("Ticks processed:   {}", processed);
    println!("Ticks rejected:    {}", rejected);
    println!("Candles closed:    {}", closed_count);
    match decision {
        Some(decision) => println!("{} signal:  {}", strategy.name(), decision),
        None => println!("{} signal:  no closed candles", strategy.name()),
    }

    Ok(())
}
