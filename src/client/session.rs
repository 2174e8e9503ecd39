//! The session runtime.
//!
//! Owns the [`SessionState`] and wires the transport, the REST
//! collaborators, the history ring, and the notification executor around
//! the pure handler. Events are applied one at a time; collaborator I/O
//! runs on side tasks whose results re-enter through the same apply path,
//! so no event is ever half-applied when the next one is read.

use std::collections::HashMap;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::api::{self, ApiClient};
use crate::client::action::Action;
use crate::client::event::AppEvent;
use crate::client::handler;
use crate::client::state::{Message, SessionState};
use crate::config::AppConfig;
use crate::gateway::connection::spawn_transport;
use crate::gateway::manager::GatewayManager;
use crate::gateway::protocol::{ChannelMode, MessageKind};
use crate::input::history::{CommandHistory, FileStore};
use crate::notify::Alerter;

pub struct Session {
    state: SessionState,
    config: AppConfig,
    api: ApiClient,
    gateway: GatewayManager,
    history: CommandHistory<FileStore>,
    alerter: Alerter,
    event_tx: mpsc::UnboundedSender<AppEvent>,
    event_rx: mpsc::UnboundedReceiver<AppEvent>,
    transport: JoinHandle<()>,
    /// In-flight history fetches by target, so closing a target can cancel
    /// its fetch instead of letting a late result chase a dead buffer.
    history_fetches: HashMap<String, JoinHandle<()>>,
    revision: watch::Sender<u64>,
}

impl Session {
    /// Build the session and open the push channel. The transport task
    /// keeps reconnecting on its own; the session just applies what arrives.
    pub fn connect(config: AppConfig, alerter: Alerter) -> Result<Self> {
        let api = ApiClient::new(&config.gateway.http_url)?;
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (intent_tx, intent_rx) = mpsc::unbounded_channel();
        let transport = spawn_transport(
            config.gateway.clone(),
            api.clone(),
            event_tx.clone(),
            intent_rx,
        );
        let (revision, _) = watch::channel(0);
        Ok(Self {
            state: SessionState::new(),
            config,
            api,
            gateway: GatewayManager::new(intent_tx),
            history: CommandHistory::load(FileStore::new()),
            alerter,
            event_tx,
            event_rx,
            transport,
            history_fetches: HashMap::new(),
            revision,
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn command_history(&self) -> &CommandHistory<FileStore> {
        &self.history
    }

    /// Revision counter bumped after every applied event. Read-only
    /// observers watch this and re-read [`Session::state`].
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub async fn next_event(&mut self) -> Option<AppEvent> {
        self.event_rx.recv().await
    }

    /// Apply one event and execute the effects it produced.
    pub fn apply(&mut self, event: AppEvent) {
        let actions = handler::handle_event(&mut self.state, event);
        self.execute(actions);
        self.bump();
    }

    /// Submit a user-typed line: record it in the history ring, then parse
    /// and dispatch it.
    pub fn submit_line(&mut self, line: &str) {
        self.history.push(line.trim());
        let actions = handler::handle_input(&mut self.state, line);
        self.execute(actions);
        self.bump();
    }

    /// Drive the session until the transport and all event sources are gone.
    pub async fn run(&mut self) {
        while let Some(event) = self.next_event().await {
            self.apply(event);
        }
    }

    /// Tell the gateway to drop the relay connection and stop local work.
    pub fn shutdown(mut self) {
        self.gateway.disconnect();
        for (_, fetch) in self.history_fetches.drain() {
            fetch.abort();
        }
        self.transport.abort();
    }

    // -- direct operations (UI surfaces besides the input line) -----------

    pub fn send_message(&mut self, target: &str, message: &str, kind: MessageKind) {
        self.gateway.send_message(target, message, kind);
    }

    pub fn join_channel(&mut self, channel: &str) {
        // No optimistic add: the channel opens when the server confirms.
        self.gateway.join_channel(channel);
        self.bump();
    }

    pub fn part_channel(&mut self, channel: &str, message: Option<&str>) {
        self.gateway.part_channel(channel, message);
    }

    pub fn create_channel(&mut self, channel: &str, mode: ChannelMode, password: Option<&str>) {
        self.gateway.create_channel(channel, mode, password);
    }

    pub fn open_query(&mut self, nick: &str) {
        self.state.open_query(nick);
        self.bump();
    }

    pub fn close_query(&mut self, nick: &str) {
        self.state.close_query(nick);
        self.cancel_history(nick);
        self.bump();
    }

    pub fn activate_target(&mut self, target: Option<String>) {
        self.state.activate(target);
        self.bump();
    }

    pub fn clear_buffer(&mut self, target: &str) {
        self.state.clear_buffer(target);
        self.bump();
    }

    pub fn request_nicklist(&mut self, channel: &str) {
        self.gateway.request_nicklist(channel);
    }

    /// Presentation visibility feed for the notification decision.
    pub fn set_view_hidden(&mut self, hidden: bool) {
        self.state.view_hidden = hidden;
    }

    pub fn disconnect(&mut self) {
        self.gateway.disconnect();
    }

    // -- persisted-message management --------------------------------------
    //
    // Edits, deletions and pins go through the storage collaborator and are
    // reconciled into the buffer from its reply, never generated locally.

    pub async fn edit_message(&mut self, id: i64, content: &str) {
        if let Some(stored) = self.api.edit_message(id, content).await {
            self.state.update_stored(Message::from_stored(stored, Utc::now()));
            self.bump();
        }
    }

    pub async fn delete_message(&mut self, target: &str, id: i64) {
        if self.api.delete_message(id).await {
            self.state.remove_stored(target, id);
            self.bump();
        }
    }

    pub async fn pin_message(&mut self, id: i64) {
        if let Some(stored) = self.api.pin_message(id).await {
            self.state.update_stored(Message::from_stored(stored, Utc::now()));
            self.bump();
        }
    }

    pub async fn unpin_message(&mut self, id: i64) {
        if let Some(stored) = self.api.unpin_message(id).await {
            self.state.update_stored(Message::from_stored(stored, Utc::now()));
            self.bump();
        }
    }

    // -- effect execution --------------------------------------------------

    fn execute(&mut self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Push(intent) => self.gateway.push(intent),
                Action::FetchHistory { target, issued_at } => {
                    self.cancel_history(&target);
                    let api = self.api.clone();
                    let event_tx = self.event_tx.clone();
                    let limit = self.config.behavior.history_limit;
                    let task_target = target.clone();
                    let handle = tokio::spawn(async move {
                        let stored = api.load_messages(&task_target, limit, None).await;
                        let messages: Vec<Message> = stored
                            .into_iter()
                            .map(|m| Message::from_stored(m, issued_at))
                            .collect();
                        let _ = event_tx.send(AppEvent::HistoryLoaded {
                            target: task_target,
                            issued_at,
                            messages,
                        });
                    });
                    self.history_fetches.insert(target, handle);
                }
                Action::CancelHistory { target } => self.cancel_history(&target),
                Action::LoadAutoJoin => self.load_auto_join(),
                Action::Search { target, query } => {
                    let api = self.api.clone();
                    let event_tx = self.event_tx.clone();
                    tokio::spawn(async move {
                        let stored = api.search_messages(&target, &query).await;
                        let now = chrono::Utc::now();
                        let messages = stored
                            .into_iter()
                            .map(|m| Message::from_stored(m, now))
                            .collect();
                        let _ = event_tx.send(AppEvent::SearchLoaded { messages });
                    });
                }
                Action::Notify { title, body } => self.alerter.alert(&title, &body),
            }
        }
    }

    fn load_auto_join(&self) {
        let api = self.api.clone();
        let gateway = self.gateway.clone();
        let fallback = self.config.behavior.fallback_auto_join.clone();
        tokio::spawn(async move {
            let configured = api
                .user_settings()
                .await
                .and_then(|s| s.auto_join_channels)
                .map(|raw| api::parse_auto_join(&raw))
                .unwrap_or(fallback);
            for channel in configured {
                if channel.starts_with('#') {
                    gateway.join_channel(&channel);
                } else {
                    debug!(%channel, "Skipping auto-join entry without a channel sigil");
                }
            }
        });
    }

    fn cancel_history(&mut self, target: &str) {
        if let Some(fetch) = self.history_fetches.remove(target) {
            fetch.abort();
        }
    }

    fn bump(&mut self) {
        self.revision.send_modify(|r| *r += 1);
    }
}
