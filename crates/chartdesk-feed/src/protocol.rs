//! JSON wire protocol spoken over the feed socket.
//!
//! Every outgoing request carries a `req_id` that the server echoes back.
//! Tick pushes, history responses and errors are decoded into [`Incoming`].

use chartdesk_core::error::FeedError;
use chartdesk_core::types::Tick;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outgoing request body, without its `req_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Request {
    /// Start streaming ticks for a symbol
    Ticks { ticks: String, subscribe: u8 },
    /// Fetch the most recent `count` ticks for a symbol
    TicksHistory {
        ticks_history: String,
        end: String,
        count: usize,
        style: String,
    },
    /// Cancel a subscription by its server-side id
    Forget { forget: String },
    Ping { ping: u8 },
}

impl Request {
    pub fn ticks(symbol: impl Into<String>) -> Self {
        Request::Ticks {
            ticks: symbol.into(),
            subscribe: 1,
        }
    }

    pub fn history(symbol: impl Into<String>, count: usize) -> Self {
        Request::TicksHistory {
            ticks_history: symbol.into(),
            end: "latest".to_string(),
            count,
            style: "ticks".to_string(),
        }
    }

    pub fn forget(subscription_id: impl Into<String>) -> Self {
        Request::Forget {
            forget: subscription_id.into(),
        }
    }

    pub fn ping() -> Self {
        Request::Ping { ping: 1 }
    }
}

/// Serialize a request with its correlation id.
pub fn encode(request: &Request, req_id: u64) -> Result<String, FeedError> {
    let mut value =
        serde_json::to_value(request).map_err(|e| FeedError::Malformed(e.to_string()))?;
    let map = value
        .as_object_mut()
        .ok_or_else(|| FeedError::Malformed("request is not a JSON object".to_string()))?;
    map.insert("req_id".to_string(), Value::from(req_id));
    Ok(value.to_string())
}

/// A decoded server message.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    /// A streamed tick
    Tick {
        req_id: Option<u64>,
        subscription: Option<String>,
        tick: Tick,
    },
    /// Response to a history request, oldest tick first
    History { req_id: Option<u64>, ticks: Vec<Tick> },
    /// The server refused a request
    Error { req_id: Option<u64>, error: FeedError },
    /// Any other response, kept as raw JSON
    Other {
        req_id: Option<u64>,
        msg_type: String,
        payload: Value,
    },
}

impl Incoming {
    pub fn req_id(&self) -> Option<u64> {
        match self {
            Incoming::Tick { req_id, .. }
            | Incoming::History { req_id, .. }
            | Incoming::Error { req_id, .. }
            | Incoming::Other { req_id, .. } => *req_id,
        }
    }

    /// Short name used in logs and errors.
    pub fn kind(&self) -> &str {
        match self {
            Incoming::Tick { .. } => "tick",
            Incoming::History { .. } => "history",
            Incoming::Error { .. } => "error",
            Incoming::Other { msg_type, .. } => msg_type,
        }
    }

    /// Turn an error message into `Err`, pass everything else through.
    pub fn into_result(self) -> Result<Incoming, FeedError> {
        match self {
            Incoming::Error { error, .. } => Err(error),
            other => Ok(other),
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    msg_type: Option<String>,
    req_id: Option<u64>,
    tick: Option<RawTick>,
    history: Option<RawHistory>,
    error: Option<RawError>,
    subscription: Option<RawSubscription>,
}

#[derive(Deserialize)]
struct RawTick {
    quote: f64,
    /// Seconds since the epoch
    epoch: i64,
}

#[derive(Deserialize)]
struct RawHistory {
    prices: Vec<f64>,
    times: Vec<i64>,
}

#[derive(Deserialize)]
struct RawError {
    code: String,
    message: String,
}

#[derive(Deserialize)]
struct RawSubscription {
    id: String,
}

fn epoch_millis(epoch: i64) -> i64 {
    epoch.saturating_mul(1000)
}

/// Decode one text frame.
pub fn decode(text: &str) -> Result<Incoming, FeedError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| FeedError::Malformed(e.to_string()))?;
    let envelope =
        Envelope::deserialize(&value).map_err(|e| FeedError::Malformed(e.to_string()))?;
    let req_id = envelope.req_id;

    // Errors win over any payload that rides along
    if let Some(error) = envelope.error {
        return Ok(Incoming::Error {
            req_id,
            error: FeedError::Rejected {
                code: error.code,
                message: error.message,
            },
        });
    }

    if let Some(tick) = envelope.tick {
        return Ok(Incoming::Tick {
            req_id,
            subscription: envelope.subscription.map(|s| s.id),
            tick: Tick::new(tick.quote, epoch_millis(tick.epoch)),
        });
    }

    if let Some(history) = envelope.history {
        if history.prices.len() != history.times.len() {
            return Err(FeedError::Malformed(format!(
                "history has {} prices but {} times",
                history.prices.len(),
                history.times.len()
            )));
        }
        let ticks = history
            .prices
            .into_iter()
            .zip(history.times)
            .map(|(price, epoch)| Tick::new(price, epoch_millis(epoch)))
            .collect();
        return Ok(Incoming::History { req_id, ticks });
    }

    Ok(Incoming::Other {
        req_id,
        msg_type: envelope.msg_type.unwrap_or_default(),
        payload: value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_adds_req_id() {
        let text = encode(&Request::ticks("R_100"), 7).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["ticks"], "R_100");
        assert_eq!(value["subscribe"], 1);
        assert_eq!(value["req_id"], 7);
    }

    #[test]
    fn test_encode_history() {
        let text = encode(&Request::history("R_50", 500), 2).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["ticks_history"], "R_50");
        assert_eq!(value["end"], "latest");
        assert_eq!(value["count"], 500);
        assert_eq!(value["style"], "ticks");
    }

    #[test]
    fn test_decode_tick() {
        let text = r#"{"msg_type":"tick","req_id":1,"subscription":{"id":"abc"},
            "tick":{"quote":1234.5,"epoch":1700000000,"symbol":"R_100"}}"#;

        match decode(text).unwrap() {
            Incoming::Tick {
                req_id,
                subscription,
                tick,
            } => {
                assert_eq!(req_id, Some(1));
                assert_eq!(subscription.as_deref(), Some("abc"));
                assert_eq!(tick.price, 1234.5);
                assert_eq!(tick.timestamp, 1_700_000_000_000);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_decode_history() {
        let text = r#"{"msg_type":"history","req_id":3,
            "history":{"prices":[1.0,2.0,3.0],"times":[10,11,12]}}"#;

        let incoming = decode(text).unwrap();
        assert_eq!(incoming.req_id(), Some(3));
        match incoming {
            Incoming::History { ticks, .. } => {
                assert_eq!(ticks.len(), 3);
                assert_eq!(ticks[2].price, 3.0);
                assert_eq!(ticks[2].timestamp, 12_000);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_decode_mismatched_history() {
        let text = r#"{"history":{"prices":[1.0,2.0],"times":[10]}}"#;
        assert!(matches!(decode(text), Err(FeedError::Malformed(_))));
    }

    #[test]
    fn test_decode_error() {
        let text = r#"{"msg_type":"ticks","req_id":4,
            "error":{"code":"InvalidSymbol","message":"Symbol XYZ is invalid"}}"#;

        let incoming = decode(text).unwrap();
        assert_eq!(incoming.kind(), "error");
        assert_eq!(
            incoming.into_result(),
            Err(FeedError::Rejected {
                code: "InvalidSymbol".to_string(),
                message: "Symbol XYZ is invalid".to_string(),
            })
        );
    }

    #[test]
    fn test_decode_other() {
        let incoming = decode(r#"{"msg_type":"ping","ping":"pong","req_id":9}"#).unwrap();

        assert_eq!(incoming.kind(), "ping");
        assert_eq!(incoming.req_id(), Some(9));
        match incoming {
            Incoming::Other { payload, .. } => assert_eq!(payload["ping"], "pong"),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(decode("not json"), Err(FeedError::Malformed(_))));
        assert!(matches!(
            decode(r#"{"tick":{"quote":"high"}}"#),
            Err(FeedError::Malformed(_))
        ));
    }
}
