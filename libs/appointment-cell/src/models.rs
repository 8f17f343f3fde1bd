use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::SheetsError;
use shared_models::error::AppError;
use shared_models::records::{Appointment, AppointmentStatus};

/// Booking form payload. Field names mirror the sheet columns so the
/// browser client can post its form state unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateAppointmentRequest {
    pub patient_name: String,
    pub phone: String,
    /// DD-MM-YYYY as typed into the date field.
    pub date: String,
    pub time: String,
    /// Ignored for the doctor role; optional for the head doctor.
    pub doctor: String,
    pub notes: String,
    pub gender: String,
    pub dob: String,
}

/// Partial update. The status toggle and the notes editor both post
/// through here; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateAppointmentRequest {
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
    /// DD-MM-YYYY, converted before it goes upstream.
    pub date: Option<String>,
    pub time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppointmentListQuery {
    /// The list view hides called-off appointments unless asked.
    pub include_not_coming: bool,
    /// Exact YYYY-MM-DD match.
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpcomingQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: i32,
    /// Zero-based, January is 0.
    pub month: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub day: u32,
    /// YYYY-MM-DD.
    pub date: String,
    pub appointments: Vec<Appointment>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarMonth {
    pub year: i32,
    /// Zero-based, echoed from the query.
    pub month: u32,
    /// Sunday-first rows; `None` cells pad the partial weeks.
    pub weeks: Vec<Vec<Option<CalendarDay>>>,
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),

    #[error("{doctor} already has an appointment on {date} at {time}")]
    SlotTaken {
        doctor: String,
        date: String,
        time: String,
    },

    #[error(transparent)]
    Sheets(#[from] SheetsError),
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation(message) => AppError::Validation(message),
            taken @ BookingError::SlotTaken { .. } => AppError::Conflict(taken.to_string()),
            BookingError::Sheets(inner) => inner.into(),
        }
    }
}
