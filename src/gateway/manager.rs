//! Outbound intent surface.
//!
//! Thin, cloneable handle over the transport task's intent queue. Every
//! method is fire-and-forget: the store never blocks on the server, and a
//! rejected intent comes back later as an inbound error event.

use tokio::sync::mpsc;
use tracing::warn;

use crate::gateway::protocol::{ChannelMode, Intent, MessageKind};

#[derive(Clone)]
pub struct GatewayManager {
    intent_tx: mpsc::UnboundedSender<Intent>,
}

impl GatewayManager {
    pub fn new(intent_tx: mpsc::UnboundedSender<Intent>) -> Self {
        Self { intent_tx }
    }

    pub fn push(&self, intent: Intent) {
        if self.intent_tx.send(intent).is_err() {
            warn!("Intent dropped: transport is gone");
        }
    }

    pub fn send_message(&self, target: &str, message: &str, kind: MessageKind) {
        self.push(Intent::SendMessage {
            target: target.to_string(),
            message: message.to_string(),
            kind,
        });
    }

    pub fn join_channel(&self, channel: &str) {
        self.push(Intent::JoinChannel {
            channel: channel.to_string(),
        });
    }

    pub fn create_channel(&self, channel: &str, mode: ChannelMode, password: Option<&str>) {
        self.push(Intent::CreateChannel {
            channel: channel.to_string(),
            mode,
            password: password.map(str::to_string),
        });
    }

    pub fn part_channel(&self, channel: &str, message: Option<&str>) {
        self.push(Intent::PartChannel {
            channel: channel.to_string(),
            message: message.map(str::to_string),
        });
    }

    pub fn change_nick(&self, nick: &str) {
        self.push(Intent::ChangeNick {
            nick: nick.to_string(),
        });
    }

    pub fn set_topic(&self, channel: &str, topic: &str) {
        self.push(Intent::SetTopic {
            channel: channel.to_string(),
            topic: topic.to_string(),
        });
    }

    pub fn request_nicklist(&self, channel: &str) {
        self.push(Intent::RequestNicklist {
            channel: channel.to_string(),
        });
    }

    pub fn whois(&self, nick: &str) {
        self.push(Intent::Whois {
            nick: nick.to_string(),
        });
    }

    pub fn list_channels(&self) {
        self.push(Intent::ListChannels);
    }

    pub fn invite(&self, nick: &str, channel: &str) {
        self.push(Intent::Invite {
            nick: nick.to_string(),
            channel: channel.to_string(),
        });
    }

    pub fn kick(&self, channel: &str, nick: &str, reason: Option<&str>) {
        self.push(Intent::Kick {
            channel: channel.to_string(),
            nick: nick.to_string(),
            reason: reason.map(str::to_string),
        });
    }

    pub fn set_away(&self, message: &str) {
        self.push(Intent::SetAway {
            message: message.to_string(),
        });
    }

    pub fn unset_away(&self) {
        self.push(Intent::UnsetAway);
    }

    pub fn ignore(&self, nick: &str) {
        self.push(Intent::Ignore {
            nick: nick.to_string(),
        });
    }

    pub fn unignore(&self, nick: &str) {
        self.push(Intent::Unignore {
            nick: nick.to_string(),
        });
    }

    pub fn who(&self, nick: &str) {
        self.push(Intent::Who {
            nick: nick.to_string(),
        });
    }

    pub fn mode(&self, target: &str) {
        self.push(Intent::Mode {
            target: target.to_string(),
        });
    }

    pub fn ctcp(&self, target: &str, command: &str) {
        self.push(Intent::Ctcp {
            target: target.to_string(),
            command: command.to_string(),
        });
    }

    pub fn disconnect(&self) {
        self.push(Intent::Disconnect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (GatewayManager, mpsc::UnboundedReceiver<Intent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (GatewayManager::new(tx), rx)
    }

    #[test]
    fn each_method_pushes_its_intent() {
        let (mgr, mut rx) = pair();
        mgr.send_message("#rust", "hi", MessageKind::Message);
        mgr.join_channel("#rust");
        mgr.create_channel("#sec", ChannelMode::Locked, Some("hunter2"));
        mgr.part_channel("#rust", Some("bye"));
        mgr.change_nick("newnick");
        mgr.set_topic("#rust", "welcome");
        mgr.request_nicklist("#rust");
        mgr.whois("bob");
        mgr.list_channels();
        mgr.invite("bob", "#rust");
        mgr.kick("#rust", "bob", None);
        mgr.set_away("lunch");
        mgr.unset_away();
        mgr.ignore("troll");
        mgr.unignore("troll");
        mgr.who("bob");
        mgr.mode("#rust");
        mgr.ctcp("bob", "VERSION");
        mgr.disconnect();

        let mut intents = Vec::new();
        while let Ok(intent) = rx.try_recv() {
            intents.push(intent);
        }
        assert_eq!(intents.len(), 19);
        assert_eq!(
            intents[0],
            Intent::SendMessage {
                target: "#rust".into(),
                message: "hi".into(),
                kind: MessageKind::Message,
            }
        );
        assert_eq!(intents[11], Intent::SetAway { message: "lunch".into() });
        assert_eq!(intents[12], Intent::UnsetAway);
        assert_eq!(
            intents[17],
            Intent::Ctcp {
                target: "bob".into(),
                command: "VERSION".into(),
            }
        );
        assert_eq!(intents[18], Intent::Disconnect);
    }

    #[test]
    fn push_after_transport_teardown_is_a_no_op() {
        let (mgr, rx) = pair();
        drop(rx);
        // Must not panic; the drop is logged.
        mgr.disconnect();
    }
}
