use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::{appointment_routes, data_routes};
use auth_cell::auth_routes;
use patient_cell::patient_routes;
use relay_cell::relay_routes;
use shared_state::AppState;
use staff_cell::staff_routes;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic Appointments API is running!" }))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/data", data_routes(state.clone()))
        .nest("/patients", patient_routes(state.clone()))
        .nest("/staff", staff_routes(state.clone()))
        .nest("/api", relay_routes(state))
}
