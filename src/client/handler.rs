//! The session transition function.
//!
//! [`handle_event`] applies one inbound event to the state and returns the
//! effects to execute; [`handle_input`] does the same for a submitted input
//! line. Both are synchronous and total: every event kind is matched, and a
//! malformed or irrelevant event degrades to a no-op rather than corrupting
//! state.

use chrono::Utc;
use tracing::debug;

use crate::client::action::Action;
use crate::client::event::AppEvent;
use crate::client::state::{ConnectionStatus, Message, SessionState};
use crate::gateway::commands::{self, ParsedCommand, COMMAND_NAMES};
use crate::gateway::protocol::{GatewayEvent, Intent, MessageKind};
use crate::notify::should_notify;

pub fn handle_event(state: &mut SessionState, event: AppEvent) -> Vec<Action> {
    match event {
        AppEvent::TransportOpened => {
            state.status = ConnectionStatus::Connecting;
            vec![]
        }
        AppEvent::TransportClosed { reason } => {
            state.status = ConnectionStatus::Disconnected;
            state.nick.clear();
            state.push_notice(format!("Connection lost: {reason}"));
            vec![]
        }
        AppEvent::Gateway(event) => handle_gateway(state, event),
        AppEvent::HistoryLoaded {
            target,
            issued_at,
            messages,
        } => {
            if !state.is_open(&target) {
                debug!(%target, "Dropping history for a closed target");
                return vec![];
            }
            // Live messages that arrived at or after the fetch issuance
            // survive; everything older is replaced by the persisted view.
            // The bound is inclusive so an arrival stamped at the exact
            // issuance instant is never dropped.
            let mut merged = messages;
            if let Some(buf) = state.buffers.get(&target) {
                merged.extend(buf.iter().filter(|m| m.arrived_at >= issued_at).cloned());
            }
            state.buffers.insert(target, merged);
            vec![]
        }
        AppEvent::SearchLoaded { messages } => {
            state.search_results = messages;
            vec![]
        }
    }
}

fn handle_gateway(state: &mut SessionState, event: GatewayEvent) -> Vec<Action> {
    match event {
        GatewayEvent::Connected { nick } => {
            let was_connected = state.status == ConnectionStatus::Connected;
            state.status = ConnectionStatus::Connected;
            state.nick = nick;
            // Auto-join replays once per transition into connected.
            if was_connected {
                vec![]
            } else {
                vec![Action::LoadAutoJoin]
            }
        }
        GatewayEvent::Error { message } => {
            state.push_notice(message);
            vec![]
        }
        GatewayEvent::Message(msg) => {
            // Channel messages buffer under the channel; direct messages
            // under the sender's nick.
            let target = if SessionState::is_channel(&msg.target) {
                msg.target.clone()
            } else {
                msg.nick.clone()
            };
            if !SessionState::is_channel(&target) && !state.queries.iter().any(|q| q == &target) {
                state.queries.push(target.clone());
            }

            let own = msg.nick.to_lowercase() == state.nick.to_lowercase();
            let mut actions = Vec::new();
            if !own
                && should_notify(
                    &msg.message,
                    &target,
                    &state.nick,
                    state.active_target.as_deref(),
                    state.view_hidden,
                )
            {
                actions.push(Action::Notify {
                    title: format!("{} mentioned you", msg.nick),
                    body: msg.message.clone(),
                });
            }

            state.append_message(Message::from_event(msg, target, Utc::now()));
            actions
        }
        GatewayEvent::Joined { channel } => {
            if !state.channels.iter().any(|c| c == &channel) {
                state.channels.push(channel.clone());
            }
            if state.active_target.is_none() {
                state.activate(Some(channel.clone()));
            }
            vec![Action::FetchHistory {
                target: channel,
                issued_at: Utc::now(),
            }]
        }
        GatewayEvent::UserJoin { channel, nick } => {
            state.user_join(&channel, &nick);
            vec![]
        }
        GatewayEvent::UserPart { channel, nick } => {
            state.user_part(&channel, &nick);
            let self_part = !state.nick.is_empty()
                && crate::client::state::ChannelUser::from_decorated(&nick).is(&state.nick);
            if self_part {
                state.remove_channel(&channel);
                return vec![Action::CancelHistory { target: channel }];
            }
            vec![]
        }
        GatewayEvent::Nicklist { channel, names } => {
            state.set_nicklist(&channel, &names);
            vec![]
        }
        GatewayEvent::Topic { channel, topic } => {
            state.topics.insert(channel, topic.unwrap_or_default());
            vec![]
        }
        GatewayEvent::ChannelListItem(item) => {
            // A new item after a completed listing starts a fresh cycle.
            if state.channel_list_complete {
                state.channel_list.clear();
                state.channel_list_complete = false;
            }
            state.channel_list.push(item);
            vec![]
        }
        GatewayEvent::ChannelListEnd => {
            state.channel_list_complete = true;
            vec![]
        }
        GatewayEvent::Whois(reply) => {
            state.whois = Some(reply);
            vec![]
        }
        GatewayEvent::Disconnected => {
            // Buffers, open targets, nicklists and topics are retained so a
            // reconnect resumes the prior view.
            state.status = ConnectionStatus::Disconnected;
            state.nick.clear();
            vec![]
        }
    }
}

/// Turn a submitted input line into effects. Lines that are not recognized
/// commands (including typo'd or structurally invalid ones) are sent as
/// literal messages to the active target.
pub fn handle_input(state: &mut SessionState, line: &str) -> Vec<Action> {
    let line = line.trim();
    if line.is_empty() {
        return vec![];
    }

    let Some(cmd) = commands::parse_command(line) else {
        return send_to_active(state, line.to_string(), MessageKind::Message);
    };

    match cmd {
        ParsedCommand::Join { channel } => vec![Action::Push(Intent::JoinChannel { channel })],
        ParsedCommand::Part { channel, message } => {
            let target = channel.or_else(|| active_channel(state));
            match target {
                Some(channel) => vec![Action::Push(Intent::PartChannel { channel, message })],
                None => {
                    state.push_notice("part: no channel in view");
                    vec![]
                }
            }
        }
        ParsedCommand::Nick { nick } => vec![Action::Push(Intent::ChangeNick { nick })],
        ParsedCommand::Me { text } => send_to_active(state, text, MessageKind::Action),
        ParsedCommand::Msg { target, text } => {
            state.open_query(&target);
            vec![Action::Push(Intent::SendMessage {
                target,
                message: text,
                kind: MessageKind::Message,
            })]
        }
        ParsedCommand::Whois { nick } => {
            state.whois = None;
            vec![Action::Push(Intent::Whois { nick })]
        }
        ParsedCommand::Who { nick } => vec![Action::Push(Intent::Who { nick })],
        ParsedCommand::Mode { target } => vec![Action::Push(Intent::Mode { target })],
        ParsedCommand::Away { message } => match message {
            Some(message) => vec![Action::Push(Intent::SetAway { message })],
            None => vec![Action::Push(Intent::UnsetAway)],
        },
        ParsedCommand::Ignore { nick } => vec![Action::Push(Intent::Ignore { nick })],
        ParsedCommand::Unignore { nick } => vec![Action::Push(Intent::Unignore { nick })],
        ParsedCommand::Kick {
            channel,
            nick,
            reason,
        } => {
            let target = channel.or_else(|| active_channel(state));
            match target {
                Some(channel) => vec![Action::Push(Intent::Kick {
                    channel,
                    nick,
                    reason,
                })],
                None => {
                    state.push_notice("kick: no channel in view");
                    vec![]
                }
            }
        }
        ParsedCommand::Ban { .. } => {
            // The gateway exposes no ban relay; op tooling lives server-side.
            state.push_notice("ban: not relayed by this gateway");
            vec![]
        }
        ParsedCommand::Invite { nick, channel } => {
            let target = channel.or_else(|| active_channel(state));
            match target {
                Some(channel) => vec![Action::Push(Intent::Invite { nick, channel })],
                None => {
                    state.push_notice("invite: no channel in view");
                    vec![]
                }
            }
        }
        ParsedCommand::Topic { text } => match active_channel(state) {
            Some(channel) => vec![Action::Push(Intent::SetTopic {
                channel,
                topic: text,
            })],
            None => {
                state.push_notice("topic: no channel in view");
                vec![]
            }
        },
        ParsedCommand::List => {
            state.channel_list.clear();
            state.channel_list_complete = false;
            vec![Action::Push(Intent::ListChannels)]
        }
        ParsedCommand::Search { query } => match state.active_target.clone() {
            Some(target) => vec![Action::Search { target, query }],
            None => {
                state.push_notice("search: no conversation in view");
                vec![]
            }
        },
        ParsedCommand::Ctcp { target, command } => {
            vec![Action::Push(Intent::Ctcp { target, command })]
        }
        ParsedCommand::Help => {
            let list = COMMAND_NAMES
                .iter()
                .map(|c| format!("/{c}"))
                .collect::<Vec<_>>()
                .join(" ");
            state.push_notice(format!("Commands: {list}"));
            vec![]
        }
    }
}

fn active_channel(state: &SessionState) -> Option<String> {
    state
        .active_target
        .clone()
        .filter(|t| SessionState::is_channel(t))
}

fn send_to_active(state: &mut SessionState, message: String, kind: MessageKind) -> Vec<Action> {
    match state.active_target.clone() {
        Some(target) => vec![Action::Push(Intent::SendMessage {
            target,
            message,
            kind,
        })],
        None => {
            state.push_notice("No conversation in view");
            vec![]
        }
    }
}
