//! Gateway protocol layer: wire types, push-channel transport, outbound
//! intents, and user slash-command parsing.

pub mod commands;
pub mod connection;
pub mod manager;
pub mod protocol;
