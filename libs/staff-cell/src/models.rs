use serde::Deserialize;
use thiserror::Error;

use shared_database::SheetsError;
use shared_models::auth::Role;
use shared_models::error::AppError;
use shared_models::records::StaffStatus;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateStaffRequest {
    pub id: String,
    pub password: String,
    pub role: Option<Role>,
    pub doctor_name: String,
    pub status: Option<StaffStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateStaffRequest {
    pub password: Option<String>,
    pub role: Option<Role>,
    pub doctor_name: Option<String>,
    pub status: Option<StaffStatus>,
}

#[derive(Debug, Error)]
pub enum StaffError {
    #[error("{0}")]
    Validation(String),

    #[error("Only the head doctor can manage staff accounts")]
    NotHeadDoctor,

    #[error(transparent)]
    Sheets(#[from] SheetsError),
}

impl From<StaffError> for AppError {
    fn from(err: StaffError) -> Self {
        match err {
            StaffError::Validation(message) => AppError::Validation(message),
            denied @ StaffError::NotHeadDoctor => AppError::Forbidden(denied.to_string()),
            StaffError::Sheets(inner) => inner.into(),
        }
    }
}
