//! WebSocket tick feed for chartdesk.
//!
//! [`FeedClient`] is an explicit, constructed client. It implements
//! [`TickSource`](chartdesk_core::traits::TickSource), keeps the tick
//! subscription alive across reconnects and correlates request/response
//! pairs through [`PendingRequests`].

pub mod client;
pub mod pending;
pub mod protocol;

pub use client::{FeedClient, FeedHandle, FeedSettings};
pub use pending::PendingRequests;
pub use protocol::{Incoming, Request};
