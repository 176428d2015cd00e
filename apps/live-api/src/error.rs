use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Failures of the pub/sub core.
///
/// `ChannelNotFound`, `NotSubscribed` and `ConnectionNotFound` are returned to
/// application code from `broadcast`/`send_to`. The rest are absorbed where
/// they happen and only ever reach the logs.
#[derive(Debug, thiserror::Error)]
pub enum PubSubError {
    #[error("channel `{0}` is not registered")]
    ChannelNotFound(String),

    #[error("connection `{connection_id}` is not subscribed to `{channel}`")]
    NotSubscribed {
        channel: String,
        connection_id: String,
    },

    #[error("connection `{0}` is not live")]
    ConnectionNotFound(String),

    #[error("connection `{0}` is already registered")]
    ConnectionExists(String),

    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),

    #[error("request context missing on connect")]
    IdentityMissing,

    #[error("write to connection `{connection_id}` failed: {reason}")]
    WriteFailed {
        connection_id: String,
        reason: &'static str,
    },
}

/// Structured API error returned to HTTP clients.
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

/// Application-level error type that converts into an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "UNAUTHORIZED".to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "NOT_FOUND".to_string(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: ApiErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<PubSubError> for ApiError {
    fn from(err: PubSubError) -> Self {
        match err {
            PubSubError::ChannelNotFound(_)
            | PubSubError::NotSubscribed { .. }
            | PubSubError::ConnectionNotFound(_) => Self::not_found(err.to_string()),
            other => {
                tracing::error!(err = %other, "pubsub error");
                Self::internal("An internal error occurred")
            }
        }
    }
}
