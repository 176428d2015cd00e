pub mod health;
pub mod sessions;

use axum::middleware;
use axum::Router;

use crate::auth::middleware::attach_context;
use crate::AppState;

/// Full application router with state applied.
///
/// The gateway sits behind [`attach_context`], which supplies the identity
/// the connect handler relies on.
pub fn router(state: AppState) -> Router {
    let gateway = crate::gateway::server::router()
        .layer(middleware::from_fn_with_state(state.clone(), attach_context));

    Router::new()
        .merge(health::router())
        .merge(sessions::router())
        .merge(gateway)
        .with_state(state)
}
