//! WebSocket upgrade handler and per-connection event loop.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Router};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time;

use crate::auth::{Identity, RequestContext};
use crate::error::{ApiError, PubSubError};
use crate::AppState;

use super::session::Connection;
use super::PubSub;

/// Close code sent when a client stops answering pings.
const CLOSE_PONG_TIMEOUT: u16 = 4009;

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_upgrade))
}

async fn ws_upgrade(
    context: Option<Extension<RequestContext>>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    // The context is attached by the auth middleware; without it there is no
    // way to tell who is connecting, so the upgrade is refused.
    let Some(Extension(context)) = context else {
        tracing::error!("request context should exist but doesn't");
        return Err(PubSubError::IdentityMissing.into());
    };

    let max_message_size = state.config.max_message_size;
    Ok(ws
        .max_message_size(max_message_size)
        .on_upgrade(move |socket| handle_connection(socket, state, context.user))
        .into_response())
}

async fn handle_connection(socket: WebSocket, state: AppState, identity: Option<Identity>) {
    let (tx, outbound_rx) = mpsc::channel(state.config.outbound_buffer);
    let connection = state.pubsub.connect(identity, tx);
    let _guard = SessionGuard {
        pubsub: state.pubsub.clone(),
        connection: connection.clone(),
    };

    tracing::info!(
        connection_id = %connection.id,
        user_id = ?connection.identity.as_ref().map(|i| i.user_id.as_str()),
        "pubsub connection opened"
    );

    let (ws_tx, ws_rx) = socket.split();
    run_session(&state, connection, ws_tx, ws_rx, outbound_rx).await;
}

/// Disconnects its connection when dropped.
///
/// Held by the connection task, so cleanup also runs when a channel hook
/// panics mid-session and the task unwinds.
struct SessionGuard {
    pubsub: Arc<PubSub>,
    connection: Arc<Connection>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.pubsub.disconnect(&self.connection.id);

        tracing::info!(
            connection_id = %self.connection.id,
            duration_ms = self.connection.connected_at.elapsed().as_millis() as u64,
            panicking = std::thread::panicking(),
            "pubsub connection closed"
        );
    }
}

/// Main session loop: dispatch client frames, drain the outbound queue, keep the peer alive.
async fn run_session(
    state: &AppState,
    connection: Arc<Connection>,
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut ws_rx: SplitStream<WebSocket>,
    mut outbound_rx: mpsc::Receiver<Utf8Bytes>,
) {
    let pong_timeout = state.config.pong_timeout;
    let mut ping_timer = time::interval(state.config.ping_interval);
    ping_timer.tick().await; // First tick fires immediately; skip it.
    let mut last_seen = Instant::now();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        last_seen = Instant::now();
                        state.pubsub.handle_frame(&connection, text.as_str());
                    }
                    Some(Ok(Message::Pong(_))) | Some(Ok(Message::Ping(_))) => {
                        last_seen = Instant::now();
                    }
                    Some(Ok(Message::Binary(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(?e, connection_id = %connection.id, "ws read error");
                        break;
                    }
                }
            }

            frame = outbound_rx.recv() => {
                let Some(frame) = frame else { break };
                if ws_tx.send(Message::Text(frame)).await.is_err() {
                    break;
                }
            }

            _ = ping_timer.tick() => {
                if last_seen.elapsed() > pong_timeout {
                    tracing::debug!(connection_id = %connection.id, "pong timeout, closing connection");
                    let _ = send_close(&mut ws_tx, CLOSE_PONG_TIMEOUT, "Pong timeout").await;
                    break;
                }
                if ws_tx.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// Send a WebSocket close frame with a code and reason.
async fn send_close(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    code: u16,
    reason: &str,
) -> Result<(), axum::Error> {
    let close_msg = Message::Close(Some(CloseFrame {
        code,
        reason: reason.to_string().into(),
    }));
    ws_tx.send(close_msg).await
}
