//! Client-side session core for the NullRoute chat gateway.
//!
//! The gateway relays an IRC-style multiplexed chat protocol over a single
//! persistent websocket push channel per logged-in session. This crate owns
//! the state that makes that stream usable: which channels and queries are
//! open, what messages belong to each, who is present, what the topic is,
//! which targets have unread activity, and whether a mention should alert
//! the user. Rendering, authentication, and message persistence live in
//! external collaborators reached over REST.

pub mod api;
pub mod client;
pub mod colors;
pub mod config;
pub mod gateway;
pub mod input;
pub mod notify;

pub use client::session::Session;
pub use client::state::SessionState;
pub use gateway::protocol::{GatewayEvent, Intent};
