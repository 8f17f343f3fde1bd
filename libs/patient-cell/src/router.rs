use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_state::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn patient_routes(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::list_patients))
        .route("/", post(handlers::create_patient))
        .route("/search", get(handlers::search_patients))
        .route("/{id}", put(handlers::update_patient))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
