use std::sync::Arc;

use axum::extract::{Json, State};
use serde_json::Value;
use tracing::debug;

use shared_models::error::AppError;
use shared_state::AppState;

/// Escape hatch for browser clients that still speak the sheet script's
/// form dialect directly. The body goes upstream untouched and the
/// normalized envelope comes straight back, script-reported failures
/// included; only transport problems become errors here.
#[axum::debug_handler]
pub async fn proxy(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<Value>, AppError> {
    debug!("Proxying a raw form request");
    let envelope = state.sheets.forward_raw(body).await?;
    Ok(Json(envelope))
}
