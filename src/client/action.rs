//! Declarative effects produced by the handler.
//!
//! The handler mutates state and returns these; the session runtime performs
//! the I/O. This keeps every transition rule unit-testable without a live
//! gateway.

use chrono::{DateTime, Utc};

use crate::gateway::protocol::Intent;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Fire-and-forget push to the gateway. Failures come back later as
    /// inbound error events, never synchronously.
    Push(Intent),
    /// Fetch the most recent persisted messages for a freshly opened target.
    FetchHistory {
        target: String,
        issued_at: DateTime<Utc>,
    },
    /// Abort the in-flight history fetch for a target that closed.
    CancelHistory { target: String },
    /// Read the per-user settings collaborator and join the configured
    /// auto-join channels.
    LoadAutoJoin,
    /// Full-text search within a target via the storage collaborator.
    Search { target: String, query: String },
    /// Alert the user about a mention. Executed by the notification
    /// collaborators; their failures are swallowed.
    Notify { title: String, body: String },
}
