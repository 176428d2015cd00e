//! Session tokens that map a browser session to its identity.

use crate::db::kv::KeyValueStore;
use crate::error::ApiError;

use super::middleware::Identity;

/// Session token TTL in seconds (12 hours).
pub const SESSION_TTL_SECS: u64 = 12 * 3600;

/// Generate an opaque random token with the given prefix.
pub fn generate_opaque_token(prefix: &str, bytes: usize) -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use rand::Rng;
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill(&mut buf[..]);
    format!("{}_{}", prefix, URL_SAFE_NO_PAD.encode(&buf))
}

pub fn generate_session_token() -> String {
    generate_opaque_token("lst", 32)
}

fn session_key(token: &str) -> String {
    format!("live:session:{}", token)
}

pub async fn store_session(
    kv: &dyn KeyValueStore,
    token: &str,
    identity: &Identity,
) -> Result<(), ApiError> {
    let value =
        serde_json::to_string(identity).map_err(|_| ApiError::internal("serialization"))?;
    kv.set_ex(&session_key(token), &value, SESSION_TTL_SECS).await
}

pub async fn lookup_session(
    kv: &dyn KeyValueStore,
    token: &str,
) -> Result<Option<Identity>, ApiError> {
    match kv.get(&session_key(token)).await? {
        Some(v) => {
            let identity: Identity =
                serde_json::from_str(&v).map_err(|_| ApiError::internal("corrupt session data"))?;
            Ok(Some(identity))
        }
        None => Ok(None),
    }
}

pub async fn revoke_session(kv: &dyn KeyValueStore, token: &str) -> Result<(), ApiError> {
    kv.del(&session_key(token)).await
}
