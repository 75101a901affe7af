//! Socket Mode connection — the persistent WebSocket to Slack.
//!
//! Envelope flow: frame arrives → parsed → ACKed immediately (Slack
//! redelivers anything not acknowledged within its deadline) → handed
//! to the dispatcher. The ack must come first, before any business
//! logic, and never waits on it.
//!
//! The connection is kept alive with periodic protocol pings regardless
//! of queue activity, and re-established with backoff when it drops.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::{Mutex, Notify};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, warn};

use crate::dispatcher::Dispatcher;
use crate::events::{SocketAck, SocketEnvelope};
use crate::SlackApi;

/// Reconnect backoff base (seconds).
const RECONNECT_DELAY_SECS: u64 = 5;

/// Maximum reconnect attempts before giving up.
const MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Interval between client-initiated keepalive pings (seconds).
const PING_INTERVAL_SECS: u64 = 60;

/// Type alias for the WebSocket sink.
type WsSender = futures_util::stream::SplitSink<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
    WsMessage,
>;

/// Owns the Socket Mode connection and feeds the dispatcher.
pub struct SocketListener {
    api: SlackApi,
    app_token: String,
    dispatcher: Arc<Dispatcher>,
    shutdown: Arc<Notify>,
    /// Active WebSocket write half (for sending ACKs and pings).
    ws_write: Arc<Mutex<Option<WsSender>>>,
}

impl SocketListener {
    pub fn new(api: SlackApi, app_token: impl Into<String>, dispatcher: Arc<Dispatcher>) -> Self {
        SocketListener {
            api,
            app_token: app_token.into(),
            dispatcher,
            shutdown: Arc::new(Notify::new()),
            ws_write: Arc::new(Mutex::new(None)),
        }
    }

    /// Signal the listener to close the connection and return.
    pub fn signal_shutdown(&self) {
        self.shutdown.notify_waiters();
    }

    /// Main Socket Mode loop — connects, receives envelopes, ACKs, and
    /// reconnects on failure. Returns only on shutdown or when the
    /// reconnect budget is exhausted.
    pub async fn run(&self) -> Result<()> {
        let mut attempts: u32 = 0;

        loop {
            if attempts > 0 {
                let delay = Duration::from_secs(RECONNECT_DELAY_SECS * (attempts as u64).min(6));
                info!(
                    attempt = attempts,
                    delay_secs = delay.as_secs(),
                    "reconnecting to Slack Socket Mode..."
                );
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = self.shutdown.notified() => {
                        info!("shutdown during reconnect backoff");
                        return Ok(());
                    }
                }
            }

            if attempts >= MAX_RECONNECT_ATTEMPTS {
                anyhow::bail!("exceeded max reconnect attempts ({MAX_RECONNECT_ATTEMPTS})");
            }

            // Each connection needs a fresh single-use URL.
            let ws_url = match self.api.connections_open(&self.app_token).await {
                Ok(url) => {
                    debug!(url = %url, "got Socket Mode URL");
                    url
                }
                Err(e) => {
                    error!(error = %e, "failed to get Socket Mode URL");
                    attempts += 1;
                    continue;
                }
            };

            let ws_stream = match tokio_tungstenite::connect_async(&ws_url).await {
                Ok((stream, _)) => {
                    info!("connected to Slack Socket Mode");
                    attempts = 0;
                    stream
                }
                Err(e) => {
                    error!(error = %e, "WebSocket connect failed");
                    attempts += 1;
                    continue;
                }
            };

            let (write, mut read) = ws_stream.split();
            {
                let mut guard = self.ws_write.lock().await;
                *guard = Some(write);
            }

            let mut ping_timer =
                tokio::time::interval(Duration::from_secs(PING_INTERVAL_SECS));
            ping_timer.tick().await; // first tick fires immediately

            // Read loop
            loop {
                tokio::select! {
                    msg = read.next() => {
                        match msg {
                            Some(Ok(WsMessage::Text(text))) => {
                                self.handle_frame(&text).await;
                            }
                            Some(Ok(WsMessage::Ping(data))) => {
                                let mut guard = self.ws_write.lock().await;
                                if let Some(ref mut w) = *guard {
                                    let _ = w.send(WsMessage::Pong(data)).await;
                                }
                            }
                            Some(Ok(WsMessage::Close(_))) => {
                                info!("Slack WebSocket closed by server");
                                break;
                            }
                            Some(Err(e)) => {
                                warn!(error = %e, "Slack WebSocket error");
                                break;
                            }
                            None => {
                                info!("Slack WebSocket stream ended");
                                break;
                            }
                            _ => {} // Pong, Binary, etc.
                        }
                    }
                    _ = ping_timer.tick() => {
                        let mut guard = self.ws_write.lock().await;
                        if let Some(ref mut w) = *guard {
                            if let Err(e) = w.send(WsMessage::Ping(Vec::new().into())).await {
                                warn!(error = %e, "keepalive ping failed");
                            }
                        }
                    }
                    _ = self.shutdown.notified() => {
                        info!("shutdown signal received");
                        let mut guard = self.ws_write.lock().await;
                        if let Some(ref mut w) = *guard {
                            let _ = w.close().await;
                        }
                        *guard = None;
                        return Ok(());
                    }
                }
            }

            // Clean up write half before reconnect
            {
                let mut guard = self.ws_write.lock().await;
                *guard = None;
            }
            attempts += 1;
        }
    }

    /// Handle a single WebSocket text frame: connection-level messages
    /// first, then envelope ACK + dispatch.
    async fn handle_frame(&self, text: &str) {
        // hello/disconnect are connection chatter, not envelopes
        if let Ok(msg) = serde_json::from_str::<Value>(text) {
            match msg["type"].as_str() {
                Some("hello") => {
                    info!("received Socket Mode hello");
                    return;
                }
                Some("disconnect") => {
                    let reason = msg["reason"].as_str().unwrap_or("unknown");
                    // The read loop handles reconnection when the
                    // server actually drops us.
                    info!(reason = %reason, "Slack requested disconnect");
                    return;
                }
                _ => {}
            }
        }

        let envelope: SocketEnvelope = match serde_json::from_str(text) {
            Ok(e) => e,
            Err(e) => {
                debug!(error = %e, "failed to parse Socket Mode envelope");
                return;
            }
        };

        if !envelope.requires_ack() {
            info!(
                envelope_type = %envelope.envelope_type,
                "received unexpected envelope type"
            );
            return;
        }

        // ACK before anything else so Slack does not redeliver.
        self.send_ack(&envelope.envelope_id).await;

        self.dispatcher.on_envelope(envelope).await;
    }

    async fn send_ack(&self, envelope_id: &str) {
        let ack = SocketAck {
            envelope_id: envelope_id.to_string(),
        };
        let Ok(ack_json) = serde_json::to_string(&ack) else {
            return;
        };

        let mut guard = self.ws_write.lock().await;
        match *guard {
            Some(ref mut w) => {
                if let Err(e) = w.send(WsMessage::Text(ack_json.into())).await {
                    warn!(error = %e, "failed to send ACK");
                }
            }
            None => warn!(envelope_id = %envelope_id, "no connection to ACK on"),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
