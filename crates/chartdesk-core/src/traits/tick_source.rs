//! Tick source trait definition.

use crate::error::FeedError;
use crate::types::Tick;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Anything that can deliver a live or replayed tick stream.
///
/// Ticks arrive on the returned channel in non-decreasing timestamp order.
/// The channel closes when the source is exhausted or gives up.
#[async_trait]
pub trait TickSource: Send {
    /// Subscribe to ticks for a symbol.
    ///
    /// # Arguments
    /// * `symbol` - The instrument to stream
    ///
    /// # Returns
    /// A channel receiver that yields ticks
    async fn subscribe(&mut self, symbol: &str) -> Result<mpsc::Receiver<Tick>, FeedError>;

    /// Get the source name.
    fn name(&self) -> &str;
}
