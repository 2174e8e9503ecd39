//! Session state: the single queryable view of "what is true right now".
//!
//! One [`SessionState`] per logged-in session. It is mutated only by the
//! event handler; everything else reads. Channels open on server-confirmed
//! join (never optimistically), queries open on first inbound direct message
//! or an explicit open, and both survive a disconnect so a reconnect resumes
//! with the prior view intact.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::api::{Reaction, StoredMessage};
use crate::gateway::protocol::{ChannelListItem, MessageEvent, MessageKind, WhoisReply};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

/// One entry in a channel's buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub nick: String,
    pub body: String,
    pub target: String,
    pub time: Option<DateTime<Utc>>,
    pub kind: MessageKind,
    /// Persisted id, present for messages the storage collaborator knows.
    pub id: Option<i64>,
    pub edited_at: Option<DateTime<Utc>>,
    pub pinned: bool,
    pub reactions: Vec<Reaction>,
    /// When this record entered the local buffer. Used to reconcile an
    /// in-flight history fetch with live arrivals.
    pub arrived_at: DateTime<Utc>,
}

impl Message {
    pub fn from_event(event: MessageEvent, target: String, arrived_at: DateTime<Utc>) -> Self {
        Self {
            nick: event.nick,
            body: event.message,
            target,
            time: event.time,
            kind: event.kind,
            id: None,
            edited_at: None,
            pinned: false,
            reactions: Vec::new(),
            arrived_at,
        }
    }

    pub fn from_stored(stored: StoredMessage, arrived_at: DateTime<Utc>) -> Self {
        Self {
            nick: stored.nick,
            body: stored.content,
            target: stored.channel,
            time: stored.inserted_at,
            kind: stored.message_type,
            id: Some(stored.id),
            edited_at: stored.edited_at,
            pinned: stored.pinned,
            reactions: stored.reactions,
            arrived_at,
        }
    }
}

/// A nicklist entry: nick plus optional status glyph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelUser {
    pub nick: String,
    pub prefix: String,
}

impl ChannelUser {
    const STATUS_GLYPHS: [char; 5] = ['@', '+', '%', '~', '&'];

    /// Split a decorated name like `"@alice"` into glyph and nick.
    pub fn from_decorated(name: &str) -> Self {
        match name.chars().next() {
            Some(glyph) if Self::STATUS_GLYPHS.contains(&glyph) => Self {
                nick: name[glyph.len_utf8()..].to_string(),
                prefix: glyph.to_string(),
            },
            _ => Self {
                nick: name.to_string(),
                prefix: String::new(),
            },
        }
    }

    pub fn display_name(&self) -> String {
        format!("{}{}", self.prefix, self.nick)
    }

    /// Case-insensitive, prefix-insensitive identity test.
    pub fn is(&self, nick: &str) -> bool {
        let other = ChannelUser::from_decorated(nick);
        self.nick.to_lowercase() == other.nick.to_lowercase()
    }
}

/// A transient, non-blocking alert (protocol errors, local diagnostics).
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub text: String,
    pub time: DateTime<Utc>,
}

#[derive(Debug)]
pub struct SessionState {
    pub status: ConnectionStatus,
    pub nick: String,
    /// Open channels, in join order. Disjoint from `queries`.
    pub channels: Vec<String>,
    /// Open direct-message conversations, in open order.
    pub queries: Vec<String>,
    pub active_target: Option<String>,
    pub buffers: HashMap<String, Vec<Message>>,
    pub nicklists: HashMap<String, Vec<ChannelUser>>,
    pub topics: HashMap<String, String>,
    /// Per-target unread counts. Never holds an entry for the active target.
    pub unread: HashMap<String, u32>,
    pub notices: Vec<Notice>,
    pub channel_list: Vec<ChannelListItem>,
    pub channel_list_complete: bool,
    pub whois: Option<WhoisReply>,
    pub search_results: Vec<Message>,
    /// Whether the presentation surface is currently hidden from the user.
    /// Feeds the notification decision; set by the embedder.
    pub view_hidden: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            nick: String::new(),
            channels: Vec::new(),
            queries: Vec::new(),
            active_target: None,
            buffers: HashMap::new(),
            nicklists: HashMap::new(),
            topics: HashMap::new(),
            unread: HashMap::new(),
            notices: Vec::new(),
            channel_list: Vec::new(),
            channel_list_complete: false,
            whois: None,
            search_results: Vec::new(),
            view_hidden: false,
        }
    }

    pub fn is_channel(target: &str) -> bool {
        target.starts_with('#')
    }

    pub fn is_open(&self, target: &str) -> bool {
        self.channels.iter().any(|c| c == target) || self.queries.iter().any(|q| q == target)
    }

    pub fn buffer(&self, target: &str) -> &[Message] {
        self.buffers.get(target).map_or(&[], Vec::as_slice)
    }

    pub fn clear_buffer(&mut self, target: &str) {
        if let Some(buf) = self.buffers.get_mut(target) {
            buf.clear();
        }
    }

    /// Append a message to its target's buffer, bumping the unread count
    /// unless that target is the one being viewed.
    pub fn append_message(&mut self, msg: Message) {
        let target = msg.target.clone();
        self.buffers.entry(target.clone()).or_default().push(msg);
        if self.active_target.as_deref() != Some(target.as_str()) {
            *self.unread.entry(target).or_insert(0) += 1;
        }
    }

    pub fn activate(&mut self, target: Option<String>) {
        if let Some(ref t) = target {
            self.unread.remove(t);
        }
        self.active_target = target;
    }

    /// Open (or re-focus) a direct-message conversation. Idempotent:
    /// reopening an existing query activates it without reordering.
    pub fn open_query(&mut self, nick: &str) {
        if !self.queries.iter().any(|q| q == nick) {
            self.queries.push(nick.to_string());
        }
        self.activate(Some(nick.to_string()));
    }

    pub fn close_query(&mut self, nick: &str) {
        self.queries.retain(|q| q != nick);
        if self.active_target.as_deref() == Some(nick) {
            let next = self
                .channels
                .first()
                .or_else(|| self.queries.first())
                .cloned();
            self.activate(next);
        }
    }

    /// Drop a channel from the open set (we parted or were kicked) and
    /// re-activate the next best target if it was the one in view.
    pub fn remove_channel(&mut self, channel: &str) {
        self.channels.retain(|c| c != channel);
        if self.active_target.as_deref() == Some(channel) {
            let next = self
                .channels
                .first()
                .or_else(|| self.queries.first())
                .cloned();
            self.activate(next);
        }
    }

    pub fn nicklist(&self, channel: &str) -> &[ChannelUser] {
        self.nicklists.get(channel).map_or(&[], Vec::as_slice)
    }

    /// Undecorated nicks for one channel; the completion candidate pool.
    pub fn nick_names(&self, channel: &str) -> Vec<String> {
        self.nicklist(channel)
            .iter()
            .map(|u| u.nick.clone())
            .collect()
    }

    /// Add a member. No-op when an entry already matches the nick
    /// case-insensitively ignoring any status glyph.
    pub fn user_join(&mut self, channel: &str, nick: &str) {
        let list = self.nicklists.entry(channel.to_string()).or_default();
        if !list.iter().any(|u| u.is(nick)) {
            list.push(ChannelUser::from_decorated(nick));
        }
    }

    /// Remove a member by the same identity rule. Returns true if an entry
    /// was removed.
    pub fn user_part(&mut self, channel: &str, nick: &str) -> bool {
        match self.nicklists.get_mut(channel) {
            Some(list) => {
                let before = list.len();
                list.retain(|u| !u.is(nick));
                list.len() != before
            }
            None => false,
        }
    }

    /// Full nicklist replacement from a snapshot. Duplicate decorated names
    /// resolving to the same nick keep their first occurrence.
    pub fn set_nicklist(&mut self, channel: &str, names: &[String]) {
        let mut list: Vec<ChannelUser> = Vec::with_capacity(names.len());
        for name in names {
            let user = ChannelUser::from_decorated(name);
            if !list.iter().any(|u| u.is(&user.nick)) {
                list.push(user);
            }
        }
        self.nicklists.insert(channel.to_string(), list);
    }

    pub fn push_notice(&mut self, text: impl Into<String>) {
        self.notices.push(Notice {
            text: text.into(),
            time: Utc::now(),
        });
    }

    /// In-place replacement of a persisted message (edit, pin, reaction
    /// change) returned by the storage collaborator.
    pub fn update_stored(&mut self, updated: Message) {
        let Some(id) = updated.id else { return };
        if let Some(buf) = self.buffers.get_mut(&updated.target) {
            if let Some(slot) = buf.iter_mut().find(|m| m.id == Some(id)) {
                let arrived_at = slot.arrived_at;
                *slot = Message { arrived_at, ..updated };
            }
        }
    }

    /// Remove a message deleted upstream.
    pub fn remove_stored(&mut self, target: &str, id: i64) {
        if let Some(buf) = self.buffers.get_mut(target) {
            buf.retain(|m| m.id != Some(id));
        }
    }
}
