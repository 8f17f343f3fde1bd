use std::sync::Arc;

use axum::{routing::post, Router};

use shared_state::AppState;

use crate::handlers;

/// Deliberately unauthenticated: the legacy clients this serves never
/// carried a session header.
pub fn relay_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/proxy", post(handlers::proxy))
        .with_state(state)
}
