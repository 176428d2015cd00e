mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum_test::TestServer;
use futures_util::SinkExt;
use serde_json::json;

use live_api::config::Config;
use live_api::AppState;

use common::{assert_silent, connect, frame, recv_text, wait_until};

const ISSUER_KEY: &str = "issuer-test-key";

/// State built exactly as the binary builds it, with session issuing enabled.
fn server_state() -> AppState {
    AppState::from_config(Config {
        session_issuer_key: Some(ISSUER_KEY.to_string()),
        ..Config::default()
    })
}

async fn issue(server: &TestServer, user_id: &str) -> String {
    let resp = server
        .post("/sessions")
        .add_header(AUTHORIZATION, format!("Bearer {ISSUER_KEY}"))
        .json(&json!({ "user_id": user_id, "display_name": "Viewer" }))
        .await;
    resp.assert_status(StatusCode::CREATED);

    let body: serde_json::Value = resp.json();
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 12 * 3600);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn issued_session_authenticates_websocket() {
    let state = server_state();
    let server = TestServer::new(live_api::routes::router(state.clone())).unwrap();
    let token = issue(&server, "usr_viewer").await;
    assert!(token.starts_with("lst_"));

    let addr = common::start_ws_server(state.clone()).await;
    let mut ws = connect(addr, Some(&token)).await;
    ws.send(frame("subscribe", "chat")).await.unwrap();
    wait_until(|| state.pubsub.subscriber_count("chat") == Some(1)).await;

    state
        .pubsub
        .broadcast("chat", &json!({"text": "welcome"}))
        .unwrap();
    assert_eq!(
        recv_text(&mut ws).await,
        r#"{"channel":"chat","payload":{"text":"welcome"}}"#
    );
}

#[tokio::test]
async fn revoked_session_connects_anonymously() {
    let state = server_state();
    let server = TestServer::new(live_api::routes::router(state.clone())).unwrap();
    let token = issue(&server, "usr_gone").await;

    server
        .delete(&format!("/sessions/{token}"))
        .add_header(AUTHORIZATION, format!("Bearer {ISSUER_KEY}"))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let addr = common::start_ws_server(state.clone()).await;
    let mut ws = connect(addr, Some(&token)).await;
    wait_until(|| state.pubsub.connection_count() == 1).await;
    ws.send(frame("subscribe", "chat")).await.unwrap();

    assert_silent(&mut ws).await;
    assert_eq!(state.pubsub.subscriber_count("chat"), Some(0));
}

#[tokio::test]
async fn issuing_requires_issuer_key() {
    let state = server_state();
    let server = TestServer::new(live_api::routes::router(state)).unwrap();
    let body = json!({ "user_id": "usr_x", "display_name": "X" });

    server
        .post("/sessions")
        .json(&body)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let resp = server
        .post("/sessions")
        .add_header(AUTHORIZATION, "Bearer wrong-key")
        .json(&body)
        .await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
    let err: serde_json::Value = resp.json();
    assert_eq!(err["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn issuing_is_disabled_without_configured_key() {
    let state = AppState::from_config(Config::default());
    let server = TestServer::new(live_api::routes::router(state)).unwrap();

    server
        .post("/sessions")
        .add_header(AUTHORIZATION, "Bearer anything")
        .json(&json!({ "user_id": "usr_x", "display_name": "X" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn blank_user_id_is_rejected() {
    let state = server_state();
    let server = TestServer::new(live_api::routes::router(state)).unwrap();

    server
        .post("/sessions")
        .add_header(AUTHORIZATION, format!("Bearer {ISSUER_KEY}"))
        .json(&json!({ "user_id": "  ", "display_name": "Nobody" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
