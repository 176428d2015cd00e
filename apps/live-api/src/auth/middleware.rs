//! Request context extraction for the WebSocket upgrade.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use serde::{Deserialize, Serialize};

use crate::auth::tokens;
use crate::AppState;

/// The principal behind a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub display_name: String,
}

/// Per-request context attached by [`attach_context`].
///
/// Its presence in the request extensions is what the gateway checks on
/// connect; `user` is `None` for anonymous visitors.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub user: Option<Identity>,
}

/// Resolve the session token (if any) and insert a [`RequestContext`].
///
/// Browsers cannot set headers on a WebSocket handshake, so a `token` query
/// parameter is accepted as well as `Authorization: Bearer`.
pub async fn attach_context(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = bearer_token(req.headers()).or_else(|| query_token(req.uri().query()));

    let user = match token {
        Some(token) => match tokens::lookup_session(state.kv.as_ref(), &token).await {
            Ok(identity) => identity,
            Err(err) => {
                tracing::warn!(?err, "session lookup failed");
                None
            }
        },
        None => None,
    };

    req.extensions_mut().insert(RequestContext { user });
    next.run(req).await
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(String::from)
}

fn query_token(query: Option<&str>) -> Option<String> {
    query?
        .split('&')
        .find_map(|pair| pair.strip_prefix("token="))
        .filter(|t| !t.is_empty())
        .map(String::from)
}
