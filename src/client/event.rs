//! Events entering the session's apply loop.
//!
//! Everything that can change state arrives here: transport lifecycle,
//! decoded gateway pushes, and the results of async collaborator calls.
//! Each event is applied atomically before the next is read.

use chrono::{DateTime, Utc};

use crate::client::state::Message;
use crate::gateway::protocol::GatewayEvent;

#[derive(Debug)]
pub enum AppEvent {
    /// The push channel opened and the token exchange succeeded. Identity is
    /// not yet confirmed; that arrives as `Gateway(Connected)`.
    TransportOpened,
    /// The push channel dropped. State is retained; reconnection follows.
    TransportClosed { reason: String },
    /// A decoded gateway push event.
    Gateway(GatewayEvent),
    /// A history fetch resolved. `issued_at` tags the fetch so results that
    /// raced live messages can be merged instead of clobbering them.
    HistoryLoaded {
        target: String,
        issued_at: DateTime<Utc>,
        messages: Vec<Message>,
    },
    /// A full-text search resolved.
    SearchLoaded { messages: Vec<Message> },
}
