use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::HeaderMap,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use shared_database::SheetsError;
use shared_models::auth::SessionUser;
use shared_models::error::AppError;
use shared_state::AppState;
use shared_utils::jwt::{create_session_token, validate_session_token};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub password: String,
}

// Helper function to extract token
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    if !auth_value.starts_with("Bearer ") {
        return Err(AppError::Auth("Invalid authorization header format".to_string()));
    }

    Ok(auth_value[7..].to_string())
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let id = request.id.trim();
    let password = request.password.trim();
    if id.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Please enter both ID and password".to_string(),
        ));
    }

    debug!("Login attempt for {}", id);
    let user = state.sheets.login(id, password).await.map_err(|err| match err {
        SheetsError::Upstream(message) => AppError::Auth(message),
        other => AppError::ExternalService(other.to_string()),
    })?;

    let token =
        create_session_token(&user, &state.config.session_secret).map_err(AppError::Internal)?;

    // The dashboard renders straight from the store, so warm it while the
    // login response travels back.
    if let Err(err) = state.refresh_all().await {
        warn!("Post-login refresh failed: {}", err);
    }

    info!("Login succeeded for {} ({})", user.id, user.role);
    Ok(Json(json!({
        "success": true,
        "token": token,
        "user": user
    })))
}

/// Answers whether a stored session is still good. Always 200; the client
/// treats `valid: false` as "show the login page", not as a failure.
pub async fn verify_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    debug!("Verifying session token");

    let token = extract_bearer_token(&headers)?;

    match validate_session_token(&token, &state.config.session_secret) {
        Ok(user) => Ok(Json(json!({ "valid": true, "user": user }))),
        Err(_) => Ok(Json(json!({ "valid": false }))),
    }
}

pub async fn me(Extension(user): Extension<SessionUser>) -> Json<Value> {
    Json(json!({ "user": user }))
}
