use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_state::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Reads are open to any session; the write handlers gate on role
/// themselves.
pub fn staff_routes(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::list_staff))
        .route("/", post(handlers::create_staff))
        .route("/{id}", put(handlers::update_staff))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
