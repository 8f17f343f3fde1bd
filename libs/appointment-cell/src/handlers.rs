use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    Extension,
};
use serde_json::{json, Value};
use tracing::info;

use shared_models::auth::SessionUser;
use shared_models::error::AppError;
use shared_state::AppState;

use crate::models::{
    AppointmentListQuery, CalendarQuery, CreateAppointmentRequest, UpcomingQuery,
    UpdateAppointmentRequest,
};
use crate::services::booking::BookingService;
use crate::services::lifecycle::LifecycleService;
use crate::services::schedule::ScheduleService;

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = ScheduleService::new(state).list(&user, &query).await;
    Ok(Json(json!({
        "success": true,
        "total": appointments.len(),
        "appointments": appointments,
    })))
}

#[axum::debug_handler]
pub async fn upcoming_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<UpcomingQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = ScheduleService::new(state).upcoming(&user, &query).await;
    Ok(Json(json!({
        "success": true,
        "total": appointments.len(),
        "appointments": appointments,
    })))
}

#[axum::debug_handler]
pub async fn calendar_view(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Value>, AppError> {
    let calendar = ScheduleService::new(state).calendar(&user, &query).await?;
    Ok(Json(json!({
        "success": true,
        "calendar": calendar,
    })))
}

/// The bookable times for one clinic day, for the booking form's dropdown.
#[axum::debug_handler]
pub async fn time_slots(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let slots = ScheduleService::new(state).slots();
    Ok(Json(json!({
        "success": true,
        "slots": slots,
    })))
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = BookingService::new(state).book(&user, request).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Appointment booked",
        "appointment": appointment,
    })))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    LifecycleService::new(state).update(&user, &id, request).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Appointment updated",
    })))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    LifecycleService::new(state).delete(&user, &id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Appointment deleted",
    })))
}

/// The toolbar's refresh button: re-pulls all three sheets and swaps the
/// caches wholesale.
#[axum::debug_handler]
pub async fn refresh_data(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Value>, AppError> {
    info!("{} asked for a full data refresh", user.id);
    state.refresh_all().await?;
    Ok(Json(json!({
        "success": true,
        "message": "Data refreshed",
    })))
}
