//! Configuration data model.
//!
//! All structs derive `Serialize`/`Deserialize` for TOML persistence.
//! Every field has a sensible default so the client works against a local
//! gateway out of the box.

use serde::{Deserialize, Serialize};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub behavior: BehaviorConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Where the gateway lives. The HTTP base serves the REST collaborators and
/// the socket-token endpoint; the socket URL carries the push channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_http_url")]
    pub http_url: String,
    #[serde(default = "default_socket_url")]
    pub socket_url: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            http_url: default_http_url(),
            socket_url: default_socket_url(),
        }
    }
}

fn default_http_url() -> String {
    "http://127.0.0.1:4000".into()
}

fn default_socket_url() -> String {
    "ws://127.0.0.1:4000/socket".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorConfig {
    /// How many persisted messages to fetch when a channel opens.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
    /// Channels joined on connect when the per-user settings collaborator
    /// is unreachable.
    #[serde(default)]
    pub fallback_auto_join: Vec<String>,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            fallback_auto_join: Vec::new(),
        }
    }
}

fn default_history_limit() -> u32 {
    50
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub sound: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sound: true,
        }
    }
}

fn default_true() -> bool {
    true
}
