#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use live_api::auth::{tokens, Identity};
use live_api::config::Config;
use live_api::gateway::ChannelHandlers;
use live_api::AppState;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Hook events observed on the `chat` channel: the connection ids that
/// subscribed and unsubscribed, in order.
pub struct HookEvents {
    pub subscribed: mpsc::UnboundedReceiver<String>,
    pub unsubscribed: mpsc::UnboundedReceiver<String>,
}

/// Build state with two channels:
/// - `chat`: reports subscribe/unsubscribe hook calls through [`HookEvents`].
/// - `echo`: replies to `message` requests with the same payload.
pub fn test_state() -> (AppState, HookEvents) {
    let (sub_tx, subscribed) = mpsc::unbounded_channel();
    let (unsub_tx, unsubscribed) = mpsc::unbounded_channel();

    let state = AppState::from_config(Config {
        channels: Vec::new(),
        ..Config::default()
    });
    state.pubsub.register_channel(
        "chat",
        ChannelHandlers::new()
            .on_subscribe(move |conn| {
                let _ = sub_tx.send(conn.id.clone());
            })
            .on_unsubscribe(move |conn| {
                let _ = unsub_tx.send(conn.id.clone());
            }),
    );
    state.pubsub.register_channel(
        "echo",
        ChannelHandlers::new().on_message(|conn, msg| {
            let _ = conn.send("echo", &msg.payload);
        }),
    );

    (state, HookEvents { subscribed, unsubscribed })
}

/// Start a real TCP server for WebSocket testing. The server runs in the background.
pub async fn start_ws_server(state: AppState) -> SocketAddr {
    serve(live_api::routes::router(state)).await
}

pub async fn serve(app: axum::Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

/// Store a session token for a fresh test user and return it.
pub async fn create_session(state: &AppState, user_id: &str) -> String {
    let token = tokens::generate_session_token();
    let identity = Identity {
        user_id: user_id.to_string(),
        display_name: format!("{user_id} (test)"),
    };
    tokens::store_session(state.kv.as_ref(), &token, &identity)
        .await
        .expect("store session");
    token
}

/// Open a WebSocket to `/ws`, authenticating with a bearer token when given.
pub async fn connect(addr: SocketAddr, token: Option<&str>) -> WsStream {
    let mut request = format!("ws://{addr}/ws")
        .into_client_request()
        .expect("client request");
    if let Some(token) = token {
        request.headers_mut().insert(
            "Authorization",
            format!("Bearer {token}").parse().expect("header value"),
        );
    }

    let (ws, _) = tokio_tungstenite::connect_async(request)
        .await
        .expect("ws connect");
    ws
}

pub fn frame(kind: &str, channel: &str) -> Message {
    let body = serde_json::json!({ "type": kind, "channel": channel });
    Message::Text(body.to_string().into())
}

/// Wait for the next text frame from the server.
pub async fn recv_text(ws: &mut WsStream) -> String {
    loop {
        let msg = time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timeout waiting for frame")
            .expect("stream ended")
            .expect("ws read error");

        match msg {
            Message::Text(text) => return text.as_str().to_string(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("Expected text frame, got: {other:?}"),
        }
    }
}

/// Assert that no text frame arrives within a short window.
pub async fn assert_silent(ws: &mut WsStream) {
    let result = time::timeout(Duration::from_millis(300), ws.next()).await;
    if let Ok(Some(Ok(Message::Text(text)))) = result {
        panic!("unexpected frame: {}", text.as_str());
    }
}

/// Wait for the next hook event.
pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
    time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timeout waiting for hook")
        .expect("hook channel closed")
}

/// Poll until `condition` holds, failing after a few seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(time::Instant::now() < deadline, "condition not reached in time");
        time::sleep(Duration::from_millis(10)).await;
    }
}
