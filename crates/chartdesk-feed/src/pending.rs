//! Pending request table.

use chartdesk_core::error::FeedError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::debug;

use crate::protocol::Incoming;

/// Completion delivered to a waiting request.
pub type Response = Result<Incoming, FeedError>;

/// Requests awaiting a response, keyed by request id.
///
/// Cloning shares the same table. Locks are never held across an await.
#[derive(Clone, Default)]
pub struct PendingRequests {
    next_id: Arc<AtomicU64>,
    waiting: Arc<Mutex<HashMap<u64, oneshot::Sender<Response>>>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<u64, oneshot::Sender<Response>>> {
        self.waiting.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate a request id that is not tracked.
    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Allocate a request id and start tracking it.
    pub fn register(&self) -> (u64, oneshot::Receiver<Response>) {
        let req_id = self.next_id();
        let (tx, rx) = oneshot::channel();
        self.table().insert(req_id, tx);
        (req_id, rx)
    }

    /// Deliver a response. Returns false when nobody is waiting for `req_id`.
    pub fn complete(&self, req_id: u64, response: Response) -> bool {
        match self.table().remove(&req_id) {
            Some(tx) => {
                // The waiter may have given up already
                let _ = tx.send(response);
                true
            }
            None => false,
        }
    }

    /// Stop tracking a request without answering it.
    pub fn remove(&self, req_id: u64) -> bool {
        self.table().remove(&req_id).is_some()
    }

    /// Fail every outstanding request with `error`.
    pub fn fail_all(&self, error: FeedError) -> usize {
        let drained: Vec<_> = self.table().drain().collect();
        let count = drained.len();
        for (req_id, tx) in drained {
            debug!(req_id, error = %error, "Failing pending request");
            let _ = tx.send(Err(error.clone()));
        }
        count
    }

    /// Wait for the response to `req_id`, removing the entry on timeout.
    pub async fn wait(
        &self,
        req_id: u64,
        rx: oneshot::Receiver<Response>,
        timeout: Duration,
    ) -> Response {
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => Err(FeedError::Cancelled { req_id }),
            Err(_) => {
                self.remove(req_id);
                Err(FeedError::Timeout {
                    req_id,
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Number of outstanding requests.
    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
