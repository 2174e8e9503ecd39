//! The push-channel transport.
//!
//! One task owns the live websocket, which guarantees at most one active
//! connection per session. The task exchanges the session cookie for a
//! signed socket token, connects, pumps frames both ways, and on any close
//! reconnects with bounded exponential backoff. Malformed frames are logged
//! and skipped; they never reach the apply path.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use reqwest_websocket::{Message, RequestBuilderExt, WebSocket};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::client::event::AppEvent;
use crate::config::model::GatewayConfig;
use crate::gateway::protocol::{GatewayEvent, Intent};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("socket token exchange failed")]
    TokenExchange,
    #[error("websocket handshake failed: {0}")]
    Handshake(#[from] reqwest_websocket::Error),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Spawn the transport task. It runs until the session side of `event_tx`
/// or `intent_rx` goes away.
pub fn spawn_transport(
    config: GatewayConfig,
    api: ApiClient,
    event_tx: mpsc::UnboundedSender<AppEvent>,
    mut intent_rx: mpsc::UnboundedReceiver<Intent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut backoff = INITIAL_BACKOFF;
        loop {
            match connect(&config, &api).await {
                Ok(ws) => {
                    info!(url = %config.socket_url, "Push channel open");
                    if event_tx.send(AppEvent::TransportOpened).is_err() {
                        return;
                    }
                    backoff = INITIAL_BACKOFF;
                    match pump(ws, &event_tx, &mut intent_rx).await {
                        Some(reason) => {
                            if event_tx
                                .send(AppEvent::TransportClosed { reason })
                                .is_err()
                            {
                                return;
                            }
                        }
                        None => return, // session torn down locally
                    }
                }
                Err(e) => {
                    warn!("Gateway connect failed: {e}");
                    if event_tx.is_closed() {
                        return;
                    }
                }
            }
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
    })
}

async fn connect(config: &GatewayConfig, api: &ApiClient) -> Result<WebSocket, GatewayError> {
    let token = api
        .socket_token()
        .await
        .ok_or(GatewayError::TokenExchange)?;
    let response = reqwest::Client::default()
        .get(&config.socket_url)
        .query(&[("token", token.as_str())])
        .upgrade()
        .send()
        .await?;
    Ok(response.into_websocket().await?)
}

/// Pump frames until the connection ends. Returns `Some(reason)` when the
/// remote side closed (reconnect), `None` when the session went away.
async fn pump(
    ws: WebSocket,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
    intent_rx: &mut mpsc::UnboundedReceiver<Intent>,
) -> Option<String> {
    let (mut sink, mut stream) = ws.split();
    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<GatewayEvent>(&text) {
                        Ok(event) => {
                            if event_tx.send(AppEvent::Gateway(event)).is_err() {
                                return None;
                            }
                        }
                        // Fail closed: a frame we cannot type never mutates
                        // state.
                        Err(e) => warn!("Dropping malformed frame: {e}"),
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    if sink.send(Message::Pong(data)).await.is_err() {
                        return Some("connection lost".into());
                    }
                }
                Some(Ok(Message::Close { reason, .. })) => {
                    return Some(if reason.is_empty() {
                        "closed by gateway".into()
                    } else {
                        reason
                    });
                }
                Some(Ok(other)) => debug!("Ignoring frame: {other:?}"),
                Some(Err(e)) => return Some(e.to_string()),
                None => return Some("connection lost".into()),
            },
            intent = intent_rx.recv() => match intent {
                Some(intent) => {
                    let json = match serde_json::to_string(&intent) {
                        Ok(json) => json,
                        Err(e) => {
                            warn!("Failed to encode intent: {e}");
                            continue;
                        }
                    };
                    if let Err(e) = sink.send(Message::Text(json)).await {
                        return Some(e.to_string());
                    }
                }
                None => {
                    let _ = sink.send(Message::Close { code: reqwest_websocket::CloseCode::Normal, reason: String::new() }).await;
                    return None;
                }
            },
        }
    }
}
