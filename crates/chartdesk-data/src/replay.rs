//! In-memory tick source.

use async_trait::async_trait;
use chartdesk_core::error::FeedError;
use chartdesk_core::traits::TickSource;
use chartdesk_core::types::Tick;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Replays a fixed list of ticks, optionally paced.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    ticks: Vec<Tick>,
    pace: Option<Duration>,
    buffer: usize,
}

impl ReplaySource {
    pub fn new(ticks: Vec<Tick>) -> Self {
        Self {
            ticks,
            pace: None,
            buffer: 1024,
        }
    }

    /// Wait `pace` between consecutive ticks.
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = Some(pace);
        self
    }

    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}

#[async_trait]
impl TickSource for ReplaySource {
    async fn subscribe(&mut self, symbol: &str) -> Result<mpsc::Receiver<Tick>, FeedError> {
        let (tx, rx) = mpsc::channel(self.buffer);
        let ticks = self.ticks.clone();
        let pace = self.pace;
        let symbol = symbol.to_string();

        info!(symbol = %symbol, ticks = ticks.len(), "Starting replay");

        tokio::spawn(async move {
            for tick in ticks {
                if tx.send(tick).await.is_err() {
                    debug!(symbol = %symbol, "Replay receiver dropped");
                    return;
                }
                if let Some(pace) = pace {
                    tokio::time::sleep(pace).await;
                }
            }
            debug!(symbol = %symbol, "Replay finished");
        });

        Ok(rx)
    }

    fn name(&self) -> &str {
        "replay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replay_delivers_in_order() {
        let ticks: Vec<Tick> = (0..5).map(|i| Tick::new(i as f64, i * 1_000)).collect();
        let mut source = ReplaySource::new(ticks.clone()).with_buffer(2);

        let mut rx = source.subscribe("R_100").await.unwrap();
        let mut received = Vec::new();
        while let Some(tick) = rx.recv().await {
            received.push(tick);
        }

        assert_eq!(received, ticks);
        assert_eq!(source.name(), "replay");
    }

    #[tokio::test(start_paused = true)]
    async fn test_paced_replay() {
        let ticks = vec![Tick::new(1.0, 0), Tick::new(2.0, 1_000)];
        let mut source = ReplaySource::new(ticks).with_pace(Duration::from_millis(500));

        let mut rx = source.subscribe("R_100").await.unwrap();
        assert_eq!(rx.recv().await, Some(Tick::new(1.0, 0)));
        assert_eq!(rx.recv().await, Some(Tick::new(2.0, 1_000)));
        assert_eq!(rx.recv().await, None);
    }
}
