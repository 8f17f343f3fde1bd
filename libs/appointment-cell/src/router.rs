use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_state::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Everything on the board requires a session.
pub fn appointment_routes(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::list_appointments))
        .route("/", post(handlers::create_appointment))
        .route("/upcoming", get(handlers::upcoming_appointments))
        .route("/calendar", get(handlers::calendar_view))
        .route("/slots", get(handlers::time_slots))
        .route("/{id}", put(handlers::update_appointment))
        .route("/{id}", delete(handlers::delete_appointment))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}

/// The refresh button posts here; it re-reads every sheet, so it sits
/// outside the appointment prefix.
pub fn data_routes(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        .route("/refresh", post(handlers::refresh_data))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
