//! Wire types for the gateway push channel.
//!
//! Every frame is one JSON object: `{"event": ..., "payload": ...}` inbound,
//! `{"intent": ..., "payload": ...}` outbound. Both sides are closed,
//! exhaustively matched unions — an unknown tag fails deserialization and is
//! dropped at the transport, never silently absorbed into state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inbound push events relayed by the gateway.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum GatewayEvent {
    /// The server confirmed our identity; the session is live.
    Connected { nick: String },
    /// Protocol-level error. Surfaced, non-fatal.
    Error { message: String },
    Message(MessageEvent),
    /// We joined a channel (server-confirmed).
    Joined { channel: String },
    UserJoin { channel: String, nick: String },
    UserPart { channel: String, nick: String },
    Nicklist { channel: String, names: Vec<String> },
    Topic { channel: String, topic: Option<String> },
    ChannelListItem(ChannelListItem),
    ChannelListEnd,
    Whois(WhoisReply),
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageEvent {
    pub nick: String,
    pub target: String,
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Message,
    Action,
    System,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChannelListItem {
    pub channel: String,
    #[serde(default)]
    pub users: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WhoisReply {
    pub nick: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub realname: Option<String>,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub channels: Vec<String>,
}

/// Outbound intents. Fire-and-forget: the resulting state change, if any,
/// arrives later as an inbound event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "intent", content = "payload", rename_all = "snake_case")]
pub enum Intent {
    SendMessage {
        target: String,
        message: String,
        #[serde(rename = "type")]
        kind: MessageKind,
    },
    JoinChannel {
        channel: String,
    },
    CreateChannel {
        channel: String,
        mode: ChannelMode,
        #[serde(skip_serializing_if = "Option::is_none")]
        password: Option<String>,
    },
    PartChannel {
        channel: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    ChangeNick {
        nick: String,
    },
    SetTopic {
        channel: String,
        topic: String,
    },
    RequestNicklist {
        channel: String,
    },
    Whois {
        nick: String,
    },
    ListChannels,
    Invite {
        nick: String,
        channel: String,
    },
    Kick {
        channel: String,
        nick: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    SetAway {
        message: String,
    },
    UnsetAway,
    Ignore {
        nick: String,
    },
    Unignore {
        nick: String,
    },
    Who {
        nick: String,
    },
    Mode {
        target: String,
    },
    Ctcp {
        target: String,
        command: String,
    },
    Disconnect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMode {
    #[default]
    Public,
    Locked,
    Password,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_message_frame() {
        let frame = r##"{"event":"message","payload":{"nick":"bob","target":"#rust","message":"hi","type":"action"}}"##;
        let event: GatewayEvent = serde_json::from_str(frame).unwrap();
        match event {
            GatewayEvent::Message(m) => {
                assert_eq!(m.nick, "bob");
                assert_eq!(m.target, "#rust");
                assert_eq!(m.kind, MessageKind::Action);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn message_kind_defaults_to_plain_message() {
        let frame = r#"{"event":"message","payload":{"nick":"bob","target":"bob","message":"hi"}}"#;
        let event: GatewayEvent = serde_json::from_str(frame).unwrap();
        assert!(matches!(
            event,
            GatewayEvent::Message(MessageEvent {
                kind: MessageKind::Message,
                ..
            })
        ));
    }

    #[test]
    fn decodes_payloadless_frames() {
        let event: GatewayEvent = serde_json::from_str(r#"{"event":"disconnected"}"#).unwrap();
        assert_eq!(event, GatewayEvent::Disconnected);
        let event: GatewayEvent = serde_json::from_str(r#"{"event":"channel_list_end"}"#).unwrap();
        assert_eq!(event, GatewayEvent::ChannelListEnd);
    }

    #[test]
    fn unknown_tag_fails_closed() {
        assert!(serde_json::from_str::<GatewayEvent>(r#"{"event":"mystery","payload":{}}"#).is_err());
    }

    #[test]
    fn encodes_intent_frame() {
        let intent = Intent::SendMessage {
            target: "#rust".into(),
            message: "hello".into(),
            kind: MessageKind::Message,
        };
        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["intent"], "send_message");
        assert_eq!(json["payload"]["target"], "#rust");
        assert_eq!(json["payload"]["type"], "message");
    }

    #[test]
    fn optional_intent_fields_are_omitted() {
        let intent = Intent::PartChannel {
            channel: "#rust".into(),
            message: None,
        };
        let json = serde_json::to_value(&intent).unwrap();
        assert!(json["payload"].get("message").is_none());
    }
}
