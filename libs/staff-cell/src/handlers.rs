use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    Extension,
};
use serde_json::{json, Value};

use shared_models::auth::SessionUser;
use shared_models::error::AppError;
use shared_state::AppState;

use crate::models::{CreateStaffRequest, UpdateStaffRequest};
use crate::services::staff::StaffService;

/// Passwords stay out of this by serialization, not by filtering here.
#[axum::debug_handler]
pub async fn list_staff(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let staff = StaffService::new(state).list().await;
    Ok(Json(json!({
        "success": true,
        "total": staff.len(),
        "staff": staff,
    })))
}

#[axum::debug_handler]
pub async fn create_staff(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<CreateStaffRequest>,
) -> Result<Json<Value>, AppError> {
    let created = StaffService::new(state).create(&user, request).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Staff account created",
        "user": created,
    })))
}

#[axum::debug_handler]
pub async fn update_staff(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStaffRequest>,
) -> Result<Json<Value>, AppError> {
    StaffService::new(state).update(&user, &id, request).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Staff account updated",
    })))
}
