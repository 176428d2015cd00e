//! Session routes: the web tier issues and revokes viewer sessions here.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::middleware::bearer_token;
use crate::auth::{tokens, Identity};
use crate::error::ApiError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(issue_session))
        .route("/sessions/{token}", delete(revoke_session))
}

// ---------------------------------------------------------------------------
// POST /sessions
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct IssueSessionRequest {
    pub user_id: String,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct IssueSessionResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub ws_url: String,
}

async fn issue_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<IssueSessionRequest>,
) -> Result<(StatusCode, Json<IssueSessionResponse>), ApiError> {
    require_issuer(&state, &headers)?;

    let user_id = body.user_id.trim();
    if user_id.is_empty() {
        return Err(ApiError::bad_request("user_id must not be empty"));
    }

    let identity = Identity {
        user_id: user_id.to_string(),
        display_name: body.display_name.trim().to_string(),
    };
    let token = tokens::generate_session_token();
    tokens::store_session(state.kv.as_ref(), &token, &identity).await?;

    tracing::debug!(user_id = %identity.user_id, "session issued");

    Ok((
        StatusCode::CREATED,
        Json(IssueSessionResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: tokens::SESSION_TTL_SECS,
            ws_url: format!("ws://localhost:{}/ws", state.config.port),
        }),
    ))
}

// ---------------------------------------------------------------------------
// DELETE /sessions/{token}
// ---------------------------------------------------------------------------

/// Revoking only stops new connections; sockets already open keep their identity.
async fn revoke_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(token): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_issuer(&state, &headers)?;
    tokens::revoke_session(state.kv.as_ref(), &token).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn require_issuer(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.config.session_issuer_key.as_deref() else {
        return Err(ApiError::unauthorized("Session issuing is not enabled"));
    };
    match bearer_token(headers) {
        Some(presented) if keys_match(presented.as_bytes(), expected.as_bytes()) => Ok(()),
        _ => Err(ApiError::unauthorized("Invalid issuer key")),
    }
}

/// Compare without short-circuiting on the first differing byte.
fn keys_match(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
