use serde::Deserialize;
use thiserror::Error;

use shared_database::SheetsError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreatePatientRequest {
    pub name: String,
    pub phone: String,
    pub gender: String,
    pub dob: String,
    pub google_doc_link: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdatePatientRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub dob: Option<String>,
    pub google_doc_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PatientSearchQuery {
    pub q: String,
}

#[derive(Debug, Error)]
pub enum PatientError {
    #[error("{0}")]
    Validation(String),

    #[error("A patient with phone {0} already exists")]
    DuplicatePhone(String),

    #[error(transparent)]
    Sheets(#[from] SheetsError),
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::Validation(message) => AppError::Validation(message),
            dup @ PatientError::DuplicatePhone(_) => AppError::Conflict(dup.to_string()),
            PatientError::Sheets(inner) => inner.into(),
        }
    }
}
