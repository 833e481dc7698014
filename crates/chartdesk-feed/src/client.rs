//! WebSocket feed client.

use async_trait::async_trait;
use chartdesk_core::error::{ConfigError, FeedError};
use chartdesk_core::traits::TickSource;
use chartdesk_core::types::Tick;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::pending::PendingRequests;
use crate::protocol::{self, Incoming, Request};

/// Feed connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    /// WebSocket endpoint
    pub url: String,
    /// First reconnect delay
    pub initial_backoff_ms: u64,
    /// Reconnect delay cap
    pub max_backoff_ms: u64,
    /// Consecutive failed connection attempts before giving up, 0 for no limit
    pub max_attempts: u32,
    /// How long a correlated request waits for its response
    pub request_timeout_ms: u64,
    /// Capacity of the tick channel
    pub channel_buffer: usize,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            url: "wss://ws.derivws.com/websockets/v3?app_id=1089".to_string(),
            initial_backoff_ms: 1_000,
            max_backoff_ms: 60_000,
            max_attempts: 10,
            request_timeout_ms: 10_000,
            channel_buffer: 1_024,
        }
    }
}

impl FeedSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(ConfigError::Invalid(format!(
                "feed url must use ws:// or wss://, got {}",
                self.url
            )));
        }
        if self.initial_backoff_ms == 0 {
            return Err(ConfigError::TooSmall {
                field: "initial_backoff_ms",
                minimum: 1,
                value: 0,
            });
        }
        if self.max_backoff_ms < self.initial_backoff_ms {
            return Err(ConfigError::TooSmall {
                field: "max_backoff_ms",
                minimum: self.initial_backoff_ms,
                value: self.max_backoff_ms,
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::TooSmall {
                field: "request_timeout_ms",
                minimum: 1,
                value: 0,
            });
        }
        if self.channel_buffer == 0 {
            return Err(ConfigError::TooSmall {
                field: "channel_buffer",
                minimum: 1,
                value: 0,
            });
        }
        Ok(())
    }

    fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Frames queued for the connection task.
#[derive(Debug)]
enum Command {
    Send(String),
}

/// Cloneable handle for correlated requests over a running connection.
#[derive(Clone)]
pub struct FeedHandle {
    commands: mpsc::Sender<Command>,
    pending: PendingRequests,
    timeout: Duration,
}

impl FeedHandle {
    /// Send a request and wait for the response carrying its `req_id`.
    ///
    /// Fails with `Timeout` when no response arrives in time, with
    /// `Disconnected` when the connection drops first, and with `Rejected`
    /// when the server answers with an error.
    pub async fn request(&self, request: &Request) -> Result<Incoming, FeedError> {
        let (req_id, rx) = self.pending.register();

        let text = match protocol::encode(request, req_id) {
            Ok(text) => text,
            Err(e) => {
                self.pending.remove(req_id);
                return Err(e);
            }
        };

        if self.commands.send(Command::Send(text)).await.is_err() {
            self.pending.remove(req_id);
            return Err(FeedError::Disconnected);
        }

        debug!(req_id, "Request sent");
        self.pending.wait(req_id, rx, self.timeout).await
    }

    /// Fetch the latest `count` ticks for a symbol, oldest first.
    pub async fn tick_history(&self, symbol: &str, count: usize) -> Result<Vec<Tick>, FeedError> {
        match self.request(&Request::history(symbol, count)).await? {
            Incoming::History { ticks, .. } => Ok(ticks),
            other => Err(FeedError::Malformed(format!(
                "expected a history response, got {}",
                other.kind()
            ))),
        }
    }

    /// Number of requests still waiting for a response.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// WebSocket tick source.
///
/// Nothing connects until [`TickSource::subscribe`] is called. The
/// connection task then reconnects with exponential backoff and re-sends the
/// subscription after every reconnect. The tick channel closes once the
/// task gives up or the client is dropped.
pub struct FeedClient {
    settings: FeedSettings,
    pending: PendingRequests,
    handle: Option<FeedHandle>,
    worker: Option<JoinHandle<()>>,
}

impl FeedClient {
    pub fn new(settings: FeedSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            settings,
            pending: PendingRequests::new(),
            handle: None,
            worker: None,
        })
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    /// Request handle for the running connection, if subscribed.
    pub fn handle(&self) -> Option<FeedHandle> {
        self.handle.clone()
    }

    /// Stop the connection task and fail outstanding requests.
    pub fn shutdown(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
            info!(url = %self.settings.url, "Feed client stopped");
        }
        self.handle = None;
        self.pending.fail_all(FeedError::Disconnected);
    }
}

impl Drop for FeedClient {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

#[async_trait]
impl TickSource for FeedClient {
    async fn subscribe(&mut self, symbol: &str) -> Result<mpsc::Receiver<Tick>, FeedError> {
        // One subscription per client
        self.shutdown();

        let (tick_tx, tick_rx) = mpsc::channel(self.settings.channel_buffer);
        let (command_tx, command_rx) = mpsc::channel(64);

        let connection = Connection {
            settings: self.settings.clone(),
            symbol: symbol.to_string(),
            pending: self.pending.clone(),
            ticks: tick_tx,
            commands: command_rx,
        };

        self.worker = Some(tokio::spawn(connection.run()));
        self.handle = Some(FeedHandle {
            commands: command_tx,
            pending: self.pending.clone(),
            timeout: self.settings.request_timeout(),
        });

        Ok(tick_rx)
    }

    fn name(&self) -> &str {
        "websocket"
    }
}

/// How a connected session ended.
enum SessionEnd {
    /// The socket closed or errored after connecting
    Dropped(String),
    /// Nobody is listening for ticks any more
    Shutdown,
}

struct Connection {
    settings: FeedSettings,
    symbol: String,
    pending: PendingRequests,
    ticks: mpsc::Sender<Tick>,
    commands: mpsc::Receiver<Command>,
}

impl Connection {
    async fn run(mut self) {
        let mut backoff = self.settings.initial_backoff();
        let mut failures: u32 = 0;

        loop {
            if self.ticks.is_closed() {
                break;
            }
            info!(url = %self.settings.url, symbol = %self.symbol, "Connecting to feed");

            match self.session().await {
                Ok(SessionEnd::Shutdown) => {
                    info!(symbol = %self.symbol, "Tick receiver dropped, closing feed");
                    break;
                }
                Ok(SessionEnd::Dropped(reason)) => {
                    self.pending.fail_all(FeedError::Disconnected);
                    failures = 0;
                    backoff = self.settings.initial_backoff();
                    warn!(symbol = %self.symbol, reason = %reason, backoff = ?backoff, "Feed dropped, reconnecting");
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    self.pending.fail_all(FeedError::Disconnected);
                    failures += 1;
                    if self.settings.max_attempts > 0 && failures >= self.settings.max_attempts {
                        error!(
                            symbol = %self.symbol,
                            error = %e,
                            attempts = failures,
                            "{}",
                            FeedError::RetriesExhausted { attempts: failures }
                        );
                        break;
                    }
                    warn!(symbol = %self.symbol, error = %e, backoff = ?backoff, "Feed connection failed, reconnecting");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(self.settings.max_backoff());
                }
            }
        }

        self.pending.fail_all(FeedError::Disconnected);
    }

    /// Connect, subscribe, then pump frames until the session ends.
    async fn session(&mut self) -> Result<SessionEnd, FeedError> {
        let (socket, _) = connect_async(self.settings.url.as_str())
            .await
            .map_err(|e| FeedError::Connection(e.to_string()))?;
        let (mut write, mut read) = socket.split();

        let subscribe = protocol::encode(&Request::ticks(&self.symbol), self.pending.next_id())?;
        write
            .send(Message::Text(subscribe))
            .await
            .map_err(|e| FeedError::Connection(e.to_string()))?;
        info!(symbol = %self.symbol, "Subscribed to ticks");

        loop {
            tokio::select! {
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if !dispatch(&self.ticks, &self.pending, &text).await {
                            return Ok(SessionEnd::Shutdown);
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return Ok(SessionEnd::Dropped("closed by server".to_string()));
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Ok(SessionEnd::Dropped(e.to_string())),
                },
                Some(command) = self.commands.recv() => match command {
                    Command::Send(text) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            return Ok(SessionEnd::Dropped(e.to_string()));
                        }
                    }
                },
                _ = self.ticks.closed() => return Ok(SessionEnd::Shutdown),
            }
        }
    }
}

/// Route one frame. Returns false once the tick receiver is gone.
async fn dispatch(ticks: &mpsc::Sender<Tick>, pending: &PendingRequests, text: &str) -> bool {
    let incoming = match protocol::decode(text) {
        Ok(incoming) => incoming,
        Err(e) => {
            warn!(error = %e, "Failed to parse feed message");
            return true;
        }
    };

    match incoming {
        Incoming::Tick { tick, .. } => {
            debug!(price = tick.price, timestamp = tick.timestamp, "Tick");
            if ticks.send(tick).await.is_err() {
                return false;
            }
        }
        incoming => match incoming.req_id() {
            Some(req_id) => {
                let kind = incoming.kind().to_string();
                if !pending.complete(req_id, incoming.into_result()) {
                    if kind == "error" {
                        warn!(req_id, "Feed error for an untracked request");
                    } else {
                        debug!(req_id, kind = %kind, "Response for an untracked request");
                    }
                }
            }
            None => {
                if let Incoming::Error { error, .. } = incoming {
                    warn!(error = %error, "Feed error");
                }
            }
        },
    }
    true
}
