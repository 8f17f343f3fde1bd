use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    Extension,
};
use serde_json::{json, Value};

use shared_models::auth::SessionUser;
use shared_models::error::AppError;
use shared_state::AppState;

use crate::models::{CreatePatientRequest, PatientSearchQuery, UpdatePatientRequest};
use crate::services::patient::PatientService;

#[axum::debug_handler]
pub async fn list_patients(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let patients = PatientService::new(state).list().await;
    Ok(Json(json!({
        "success": true,
        "total": patients.len(),
        "patients": patients,
    })))
}

#[axum::debug_handler]
pub async fn search_patients(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PatientSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let patients = PatientService::new(state).search(&query.q).await?;
    Ok(Json(json!({
        "success": true,
        "patients": patients,
    })))
}

#[axum::debug_handler]
pub async fn create_patient(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    tracing::debug!("{} is registering a patient", user.id);
    let patient = PatientService::new(state).create(request).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Patient registered",
        "patient": patient,
    })))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    PatientService::new(state).update(&id, request).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Patient updated",
    })))
}
