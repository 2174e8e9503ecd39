//! REST collaborators: persisted messages, per-user settings, uploads.
//!
//! These services are consumed, not reimplemented. Every call is caught at
//! the call site and degrades to an empty or `None` result with a log line —
//! a storage hiccup must never throw into the event-apply path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::gateway::protocol::MessageKind;

/// A message as the storage collaborator persists it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub channel: String,
    pub nick: String,
    pub content: String,
    #[serde(default)]
    pub message_type: MessageKind,
    #[serde(default)]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub inserted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Reaction {
    pub id: i64,
    pub emoji: String,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// Per-user settings held by the gateway. `auto_join_channels` is a JSON
/// array encoded as a string, as the settings endpoint stores it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub auto_join_channels: Option<String>,
}

/// Server-wide settings, readable by everyone and writable by admins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default)]
    pub server_title: Option<String>,
    #[serde(default)]
    pub registration_mode: Option<String>,
    #[serde(default)]
    pub default_theme: Option<String>,
    #[serde(default)]
    pub auto_join_channels: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// An account as the admin surface lists it.
#[derive(Debug, Clone, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub nick: String,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub admin: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Upload {
    pub url: String,
    pub filename: String,
}

#[derive(Deserialize)]
struct TokenEnvelope {
    token: Option<String>,
}

#[derive(Deserialize)]
struct MessagesEnvelope {
    #[serde(default)]
    messages: Vec<StoredMessage>,
}

#[derive(Deserialize)]
struct MessageEnvelope {
    message: Option<StoredMessage>,
}

#[derive(Deserialize)]
struct ReactionEnvelope {
    reaction: Option<Reaction>,
}

#[derive(Deserialize)]
struct RolesEnvelope {
    #[serde(default)]
    roles: Vec<Role>,
}

#[derive(Deserialize)]
struct UsersEnvelope {
    #[serde(default)]
    users: Vec<UserSummary>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        // The gateway authenticates REST and token exchange by session
        // cookie, so the jar is shared across all calls.
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// Signed token for the push-channel handshake. Fetched over HTTP so it
    /// works even when a websocket proxy strips cookies.
    pub async fn socket_token(&self) -> Option<String> {
        let result = self
            .http
            .get(self.url("/api/auth/socket_token"))
            .send()
            .await;
        match result {
            Ok(res) => res
                .error_for_status()
                .ok()?
                .json::<TokenEnvelope>()
                .await
                .ok()?
                .token,
            Err(e) => {
                warn!("Failed to fetch socket token: {e}");
                None
            }
        }
    }

    pub async fn user_settings(&self) -> Option<UserSettings> {
        match self.http.get(self.url("/api/user/settings")).send().await {
            Ok(res) => res.error_for_status().ok()?.json().await.ok(),
            Err(e) => {
                warn!("Failed to load user settings: {e}");
                None
            }
        }
    }

    pub async fn update_user_settings(&self, settings: &UserSettings) -> bool {
        let result = self
            .http
            .put(self.url("/api/user/settings"))
            .json(settings)
            .send()
            .await;
        match result.and_then(|r| r.error_for_status()) {
            Ok(_) => true,
            Err(e) => {
                warn!("Failed to update user settings: {e}");
                false
            }
        }
    }

    pub async fn server_settings(&self) -> Option<ServerSettings> {
        match self.http.get(self.url("/api/server/settings")).send().await {
            Ok(res) => res.error_for_status().ok()?.json().await.ok(),
            Err(e) => {
                warn!("Failed to load server settings: {e}");
                None
            }
        }
    }

    pub async fn update_server_settings(&self, settings: &ServerSettings) -> bool {
        let result = self
            .http
            .put(self.url("/api/server/settings"))
            .json(settings)
            .send()
            .await;
        match result.and_then(|r| r.error_for_status()) {
            Ok(_) => true,
            Err(e) => {
                warn!("Failed to update server settings: {e}");
                false
            }
        }
    }

    pub async fn profile(&self, nick: &str) -> Option<Profile> {
        let result = self
            .http
            .get(self.url(&format!("/api/users/{}/profile", urlencode(nick))))
            .send()
            .await;
        match result {
            Ok(res) => res.error_for_status().ok()?.json().await.ok(),
            Err(e) => {
                warn!(%nick, "Failed to load profile: {e}");
                None
            }
        }
    }

    pub async fn update_profile(&self, profile: &Profile) -> bool {
        let result = self
            .http
            .put(self.url("/api/user/profile"))
            .json(profile)
            .send()
            .await;
        match result.and_then(|r| r.error_for_status()) {
            Ok(_) => true,
            Err(e) => {
                warn!("Failed to update profile: {e}");
                false
            }
        }
    }

    pub async fn roles(&self) -> Vec<Role> {
        match self.http.get(self.url("/api/roles")).send().await {
            Ok(res) => match res.error_for_status() {
                Ok(res) => res
                    .json::<RolesEnvelope>()
                    .await
                    .map(|e| e.roles)
                    .unwrap_or_default(),
                Err(e) => {
                    warn!("Role listing rejected: {e}");
                    Vec::new()
                }
            },
            Err(e) => {
                warn!("Role listing failed: {e}");
                Vec::new()
            }
        }
    }

    pub async fn assign_role(&self, user_id: i64, role_id: i64) -> bool {
        let result = self
            .http
            .post(self.url(&format!("/api/users/{user_id}/roles")))
            .json(&serde_json::json!({ "role_id": role_id }))
            .send()
            .await;
        match result.and_then(|r| r.error_for_status()) {
            Ok(_) => true,
            Err(e) => {
                warn!(user_id, role_id, "Failed to assign role: {e}");
                false
            }
        }
    }

    pub async fn remove_role(&self, user_id: i64, role_id: i64) -> bool {
        let result = self
            .http
            .delete(self.url(&format!("/api/users/{user_id}/roles/{role_id}")))
            .send()
            .await;
        match result.and_then(|r| r.error_for_status()) {
            Ok(_) => true,
            Err(e) => {
                warn!(user_id, role_id, "Failed to remove role: {e}");
                false
            }
        }
    }

    pub async fn users(&self) -> Vec<UserSummary> {
        match self.http.get(self.url("/api/users")).send().await {
            Ok(res) => match res.error_for_status() {
                Ok(res) => res
                    .json::<UsersEnvelope>()
                    .await
                    .map(|e| e.users)
                    .unwrap_or_default(),
                Err(e) => {
                    warn!("User listing rejected: {e}");
                    Vec::new()
                }
            },
            Err(e) => {
                warn!("User listing failed: {e}");
                Vec::new()
            }
        }
    }

    pub async fn approve_user(&self, user_id: i64) -> bool {
        let result = self
            .http
            .post(self.url(&format!("/api/users/{user_id}/approve")))
            .send()
            .await;
        match result.and_then(|r| r.error_for_status()) {
            Ok(_) => true,
            Err(e) => {
                warn!(user_id, "Failed to approve user: {e}");
                false
            }
        }
    }

    pub async fn promote_user(&self, user_id: i64) -> bool {
        let result = self
            .http
            .post(self.url(&format!("/api/users/{user_id}/promote")))
            .send()
            .await;
        match result.and_then(|r| r.error_for_status()) {
            Ok(_) => true,
            Err(e) => {
                warn!(user_id, "Failed to promote user: {e}");
                false
            }
        }
    }

    /// The `limit` most recent persisted messages for a target, oldest
    /// first, optionally only those before a known message id.
    pub async fn load_messages(
        &self,
        channel: &str,
        limit: u32,
        before_id: Option<i64>,
    ) -> Vec<StoredMessage> {
        let mut query = vec![
            ("channel".to_string(), channel.to_string()),
            ("limit".to_string(), limit.to_string()),
        ];
        if let Some(id) = before_id {
            query.push(("before_id".to_string(), id.to_string()));
        }
        let result = self
            .http
            .get(self.url("/api/messages"))
            .query(&query)
            .send()
            .await;
        match result {
            Ok(res) => match res.error_for_status() {
                Ok(res) => res
                    .json::<MessagesEnvelope>()
                    .await
                    .map(|e| e.messages)
                    .unwrap_or_default(),
                Err(e) => {
                    warn!(%channel, "History fetch rejected: {e}");
                    Vec::new()
                }
            },
            Err(e) => {
                warn!(%channel, "History fetch failed: {e}");
                Vec::new()
            }
        }
    }

    pub async fn edit_message(&self, id: i64, content: &str) -> Option<StoredMessage> {
        let result = self
            .http
            .put(self.url(&format!("/api/messages/{id}")))
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await;
        self.message_reply(result, "edit").await
    }

    pub async fn delete_message(&self, id: i64) -> bool {
        let result = self
            .http
            .delete(self.url(&format!("/api/messages/{id}")))
            .send()
            .await;
        match result.and_then(|r| r.error_for_status()) {
            Ok(_) => true,
            Err(e) => {
                warn!(id, "Failed to delete message: {e}");
                false
            }
        }
    }

    pub async fn pin_message(&self, id: i64) -> Option<StoredMessage> {
        let result = self
            .http
            .post(self.url(&format!("/api/messages/{id}/pin")))
            .send()
            .await;
        self.message_reply(result, "pin").await
    }

    pub async fn unpin_message(&self, id: i64) -> Option<StoredMessage> {
        let result = self
            .http
            .post(self.url(&format!("/api/messages/{id}/unpin")))
            .send()
            .await;
        self.message_reply(result, "unpin").await
    }

    pub async fn add_reaction(&self, id: i64, emoji: &str) -> Option<Reaction> {
        let result = self
            .http
            .post(self.url(&format!("/api/messages/{id}/reactions")))
            .json(&serde_json::json!({ "emoji": emoji }))
            .send()
            .await;
        match result {
            Ok(res) => res
                .error_for_status()
                .ok()?
                .json::<ReactionEnvelope>()
                .await
                .ok()?
                .reaction,
            Err(e) => {
                warn!(id, "Failed to add reaction: {e}");
                None
            }
        }
    }

    pub async fn remove_reaction(&self, id: i64, emoji: &str) -> bool {
        let result = self
            .http
            .delete(self.url(&format!("/api/messages/{id}/reactions")))
            .query(&[("emoji", emoji)])
            .send()
            .await;
        match result.and_then(|r| r.error_for_status()) {
            Ok(_) => true,
            Err(e) => {
                warn!(id, "Failed to remove reaction: {e}");
                false
            }
        }
    }

    pub async fn search_messages(&self, channel: &str, query: &str) -> Vec<StoredMessage> {
        let result = self
            .http
            .get(self.url(&format!(
                "/api/messages/channel/{}/search",
                urlencode(channel)
            )))
            .query(&[("query", query)])
            .send()
            .await;
        match result {
            Ok(res) => match res.error_for_status() {
                Ok(res) => res
                    .json::<MessagesEnvelope>()
                    .await
                    .map(|e| e.messages)
                    .unwrap_or_default(),
                Err(e) => {
                    warn!(%channel, "Search rejected: {e}");
                    Vec::new()
                }
            },
            Err(e) => {
                warn!(%channel, "Search failed: {e}");
                Vec::new()
            }
        }
    }

    pub async fn pinned_messages(&self, channel: &str) -> Vec<StoredMessage> {
        let result = self
            .http
            .get(self.url(&format!(
                "/api/messages/channel/{}/pinned",
                urlencode(channel)
            )))
            .send()
            .await;
        match result {
            Ok(res) => match res.error_for_status() {
                Ok(res) => res
                    .json::<MessagesEnvelope>()
                    .await
                    .map(|e| e.messages)
                    .unwrap_or_default(),
                Err(e) => {
                    warn!(%channel, "Pinned fetch rejected: {e}");
                    Vec::new()
                }
            },
            Err(e) => {
                warn!(%channel, "Pinned fetch failed: {e}");
                Vec::new()
            }
        }
    }

    pub async fn upload_file(&self, filename: &str, bytes: Vec<u8>) -> Option<Upload> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let result = self
            .http
            .post(self.url("/api/upload"))
            .multipart(form)
            .send()
            .await;
        match result {
            Ok(res) => res.error_for_status().ok()?.json().await.ok(),
            Err(e) => {
                warn!(%filename, "Upload failed: {e}");
                None
            }
        }
    }

    async fn message_reply(
        &self,
        result: Result<reqwest::Response, reqwest::Error>,
        what: &str,
    ) -> Option<StoredMessage> {
        match result {
            Ok(res) => res
                .error_for_status()
                .ok()?
                .json::<MessageEnvelope>()
                .await
                .ok()?
                .message,
            Err(e) => {
                warn!("Failed to {what} message: {e}");
                None
            }
        }
    }
}

/// Percent-encode a channel name for use in a path segment. Channel names
/// always carry `#`, which must not terminate the URL fragment-style.
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Parse the `auto_join_channels` settings field: a JSON-encoded array of
/// channel names. Malformed content yields an empty list.
pub fn parse_auto_join(raw: &str) -> Vec<String> {
    serde_json::from_str::<Vec<String>>(raw).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urlencode_escapes_the_channel_sigil() {
        assert_eq!(urlencode("#rust"), "%23rust");
        assert_eq!(urlencode("plain-name_1.x~"), "plain-name_1.x~");
    }

    #[test]
    fn auto_join_parses_a_json_array() {
        assert_eq!(
            parse_auto_join(r##"["#rust","#lobby"]"##),
            vec!["#rust".to_string(), "#lobby".to_string()]
        );
        assert!(parse_auto_join("not json").is_empty());
        assert!(parse_auto_join("[]").is_empty());
    }

    #[test]
    fn stored_message_defaults_optional_fields() {
        let raw = r##"{"id":1,"channel":"#rust","nick":"bob","content":"hi"}"##;
        let msg: StoredMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.message_type, MessageKind::Message);
        assert!(!msg.pinned);
        assert!(msg.reactions.is_empty());
    }
}
