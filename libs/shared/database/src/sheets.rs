use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error, warn};

use shared_config::AppConfig;
use shared_models::auth::{Role, SessionUser};
use shared_models::error::AppError;
use shared_models::records::{Appointment, AppointmentStatus, Patient, StaffStatus, StaffUser};
use shared_utils::dates::{normalize_backend_date, normalize_time, to_display_date};

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("could not reach the sheet script: {0}")]
    Request(#[from] reqwest::Error),

    #[error("sheet script returned {status}: {body}")]
    Http { status: StatusCode, body: Value },

    #[error("sheet script answered with HTML, the web app deployment is broken: {preview}")]
    HtmlResponse { preview: String },

    /// The script answered properly but reported a failure of its own.
    /// The message is passed along verbatim.
    #[error("{0}")]
    Upstream(String),

    #[error("could not decode sheet response: {0}")]
    Decode(String),
}

impl From<SheetsError> for AppError {
    fn from(err: SheetsError) -> Self {
        match err {
            SheetsError::Upstream(message) => AppError::BadRequest(message),
            other => AppError::ExternalService(other.to_string()),
        }
    }
}

// Write payloads. Field names here are exactly the column names the
// script expects in the form body.

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub patient_name: String,
    pub phone: String,
    /// YYYY-MM-DD.
    pub date: String,
    pub time: String,
    pub doctor: String,
    pub status: AppointmentStatus,
    pub notes: String,
    pub created_by: String,
    pub gender: String,
    pub dob: String,
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentPatch {
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
    /// YYYY-MM-DD.
    pub date: Option<String>,
    pub time: Option<String>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPatient {
    pub name: String,
    pub phone: String,
    pub gender: String,
    pub dob: String,
    pub google_doc_link: String,
}

#[derive(Debug, Clone, Default)]
pub struct PatientPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub dob: Option<String>,
    pub google_doc_link: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewStaff {
    pub id: String,
    pub password: String,
    pub role: Role,
    pub doctor_name: String,
    pub status: StaffStatus,
}

#[derive(Debug, Clone, Default)]
pub struct StaffPatch {
    pub password: Option<String>,
    pub role: Option<Role>,
    pub doctor_name: Option<String>,
    pub status: Option<StaffStatus>,
}

/// Gateway to the Apps Script web app the clinic sheet lives behind. The
/// script takes form-encoded POSTs with an `action` and a record `type`
/// and answers with a `{ success, ... }` JSON envelope on a good day.
#[derive(Clone)]
pub struct SheetsClient {
    client: Client,
    script_url: String,
}

impl SheetsClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            script_url: config.sheets_script_url.clone(),
        }
    }

    pub fn script_url(&self) -> &str {
        &self.script_url
    }

    // ---- auth ----

    pub async fn login(&self, id: &str, password: &str) -> Result<SessionUser, SheetsError> {
        debug!("Checking credentials for {}", id);
        let fields = vec![
            ("action", "read".to_string()),
            ("type", "login".to_string()),
            ("id", id.to_string()),
            ("password", password.to_string()),
        ];
        let envelope = self.post_form(&fields).await?;

        if envelope.get("success").and_then(Value::as_bool) != Some(true) {
            return Err(SheetsError::Upstream(
                envelope
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("Invalid login credentials")
                    .to_string(),
            ));
        }

        let user = envelope
            .get("user")
            .cloned()
            .filter(|user| !user.is_null())
            .ok_or_else(|| SheetsError::Decode("login response carried no user".to_string()))?;
        serde_json::from_value(user)
            .map_err(|err| SheetsError::Decode(format!("login user: {}", err)))
    }

    // ---- appointments ----

    pub async fn fetch_appointments(&self) -> Result<Vec<Appointment>, SheetsError> {
        let fields = vec![
            ("action", "read".to_string()),
            ("type", "appointments".to_string()),
        ];
        let envelope = self.post_form(&fields).await?;
        check_reported_failure(&envelope)?;

        let rows = envelope
            .get("appointments")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(rows
            .into_iter()
            .map(post_process_appointment_row)
            .filter_map(|row| decode_row::<Appointment>("appointment", row))
            .collect())
    }

    pub async fn create_appointment(
        &self,
        new: &NewAppointment,
    ) -> Result<Option<Appointment>, SheetsError> {
        let fields = vec![
            ("action", "create".to_string()),
            ("type", "appointments".to_string()),
            ("patientName", new.patient_name.clone()),
            ("phone", new.phone.clone()),
            ("date", new.date.clone()),
            ("time", new.time.clone()),
            ("doctor", new.doctor.clone()),
            ("status", new.status.to_string()),
            ("notes", new.notes.clone()),
            ("createdBy", new.created_by.clone()),
            ("gender", new.gender.clone()),
            ("dob", new.dob.clone()),
        ];
        let envelope = self.post_form(&fields).await?;
        require_success(&envelope)?;

        Ok(echoed_record(&envelope, "appointment")
            .map(post_process_appointment_row)
            .and_then(|row| decode_row("appointment", row)))
    }

    pub async fn update_appointment(
        &self,
        id: &str,
        patch: &AppointmentPatch,
    ) -> Result<(), SheetsError> {
        let mut fields = vec![
            ("action", "update".to_string()),
            ("type", "appointments".to_string()),
            ("id", id.to_string()),
        ];
        if let Some(status) = patch.status {
            fields.push(("status", status.to_string()));
        }
        if let Some(notes) = &patch.notes {
            fields.push(("notes", notes.clone()));
        }
        if let Some(date) = &patch.date {
            fields.push(("date", date.clone()));
        }
        if let Some(time) = &patch.time {
            fields.push(("time", time.clone()));
        }
        if let Some(updated_by) = &patch.updated_by {
            fields.push(("updatedBy", updated_by.clone()));
        }
        let envelope = self.post_form(&fields).await?;
        require_success(&envelope)
    }

    pub async fn delete_appointment(&self, id: &str) -> Result<(), SheetsError> {
        let fields = vec![
            ("action", "delete".to_string()),
            ("type", "appointments".to_string()),
            ("id", id.to_string()),
        ];
        let envelope = self.post_form(&fields).await?;
        require_success(&envelope)
    }

    // ---- patients ----

    pub async fn fetch_patients(&self, search: Option<&str>) -> Result<Vec<Patient>, SheetsError> {
        let mut fields = vec![
            ("action", "read".to_string()),
            ("type", "patients".to_string()),
        ];
        if let Some(term) = search {
            fields.push(("search", term.to_string()));
        }
        let envelope = self.post_form(&fields).await?;
        check_reported_failure(&envelope)?;
        Ok(rows_from(&envelope, "patients"))
    }

    pub async fn create_patient(&self, new: &NewPatient) -> Result<Option<Patient>, SheetsError> {
        let fields = vec![
            ("action", "create".to_string()),
            ("type", "patients".to_string()),
            ("name", new.name.clone()),
            ("phone", new.phone.clone()),
            ("gender", new.gender.clone()),
            ("dob", new.dob.clone()),
            ("googleDocLink", new.google_doc_link.clone()),
        ];
        let envelope = self.post_form(&fields).await?;
        require_success(&envelope)?;
        Ok(echoed_record(&envelope, "patient").and_then(|row| decode_row("patient", row)))
    }

    pub async fn update_patient(&self, id: &str, patch: &PatientPatch) -> Result<(), SheetsError> {
        let mut fields = vec![
            ("action", "update".to_string()),
            ("type", "patients".to_string()),
            ("id", id.to_string()),
        ];
        if let Some(name) = &patch.name {
            fields.push(("name", name.clone()));
        }
        if let Some(phone) = &patch.phone {
            fields.push(("phone", phone.clone()));
        }
        if let Some(gender) = &patch.gender {
            fields.push(("gender", gender.clone()));
        }
        if let Some(dob) = &patch.dob {
            fields.push(("dob", dob.clone()));
        }
        if let Some(google_doc_link) = &patch.google_doc_link {
            fields.push(("googleDocLink", google_doc_link.clone()));
        }
        let envelope = self.post_form(&fields).await?;
        require_success(&envelope)
    }

    // ---- staff ----

    /// The read side of the users sheet answers under `doctors`; the write
    /// side takes `type=user`. Two names, one sheet.
    pub async fn fetch_staff(&self) -> Result<Vec<StaffUser>, SheetsError> {
        let fields = vec![
            ("action", "read".to_string()),
            ("type", "doctors".to_string()),
        ];
        let envelope = self.post_form(&fields).await?;
        check_reported_failure(&envelope)?;
        Ok(rows_from(&envelope, "doctors"))
    }

    pub async fn create_staff(&self, new: &NewStaff) -> Result<Option<StaffUser>, SheetsError> {
        let fields = vec![
            ("action", "create".to_string()),
            ("type", "user".to_string()),
            ("id", new.id.clone()),
            ("password", new.password.clone()),
            ("role", new.role.to_string()),
            ("doctorName", new.doctor_name.clone()),
            ("status", new.status.to_string()),
        ];
        let envelope = self.post_form(&fields).await?;
        require_success(&envelope)?;
        Ok(echoed_record(&envelope, "user").and_then(|row| decode_row("user", row)))
    }

    pub async fn update_staff(&self, id: &str, patch: &StaffPatch) -> Result<(), SheetsError> {
        let mut fields = vec![
            ("action", "update".to_string()),
            ("type", "user".to_string()),
            ("id", id.to_string()),
        ];
        if let Some(password) = &patch.password {
            fields.push(("password", password.clone()));
        }
        if let Some(role) = patch.role {
            fields.push(("role", role.to_string()));
        }
        if let Some(doctor_name) = &patch.doctor_name {
            fields.push(("doctorName", doctor_name.clone()));
        }
        if let Some(status) = patch.status {
            fields.push(("status", status.to_string()));
        }
        let envelope = self.post_form(&fields).await?;
        require_success(&envelope)
    }

    // ---- relay ----

    /// Forwards a browser's own form body untouched and hands the
    /// normalized envelope straight back, application errors included.
    pub async fn forward_raw(&self, body: String) -> Result<Value, SheetsError> {
        debug!("Relaying {} bytes to the sheet script", body.len());
        let response = self
            .client
            .post(&self.script_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;
        handle_response(response).await
    }

    async fn post_form(&self, fields: &[(&'static str, String)]) -> Result<Value, SheetsError> {
        let action = field_value(fields, "action");
        let record_type = field_value(fields, "type");
        debug!("Posting {} {} to the sheet script", action, record_type);

        let response = self
            .client
            .post(&self.script_url)
            .form(&fields)
            .send()
            .await?;
        handle_response(response).await
    }
}

fn field_value<'a>(fields: &'a [(&'static str, String)], key: &str) -> &'a str {
    fields
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, value)| value.as_str())
        .unwrap_or("?")
}

async fn handle_response(response: reqwest::Response) -> Result<Value, SheetsError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        error!("Sheet script error ({}): {}", status, preview(&text));
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        return Err(SheetsError::Http { status, body });
    }

    normalize_body(&text)
}

/// The script answers JSON on a good day, an HTML error page when the
/// deployment is broken, and occasionally bare text.
fn normalize_body(text: &str) -> Result<Value, SheetsError> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => Ok(value),
        Err(_) if looks_like_html(text) => {
            error!("Sheet script answered with HTML: {}", preview(text));
            Err(SheetsError::HtmlResponse {
                preview: preview(text),
            })
        }
        Err(_) => Ok(json!({ "success": true, "data": text })),
    }
}

fn looks_like_html(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("<!doctype") || lower.contains("<html")
}

fn preview(text: &str) -> String {
    text.chars().take(200).collect()
}

fn check_reported_failure(envelope: &Value) -> Result<(), SheetsError> {
    if envelope.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(SheetsError::Upstream(upstream_error(envelope)));
    }
    Ok(())
}

fn require_success(envelope: &Value) -> Result<(), SheetsError> {
    match envelope.get("success").and_then(Value::as_bool) {
        Some(true) => Ok(()),
        _ => Err(SheetsError::Upstream(upstream_error(envelope))),
    }
}

fn upstream_error(envelope: &Value) -> String {
    envelope
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("The sheet script reported a failure")
        .to_string()
}

fn echoed_record(envelope: &Value, key: &str) -> Option<Value> {
    envelope.get(key).cloned().filter(|row| !row.is_null())
}

fn rows_from<T: DeserializeOwned>(envelope: &Value, key: &str) -> Vec<T> {
    let Some(rows) = envelope.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };
    rows.iter()
        .filter_map(|row| decode_row(key, row.clone()))
        .collect()
}

fn decode_row<T: DeserializeOwned>(kind: &str, row: Value) -> Option<T> {
    match serde_json::from_value(row) {
        Ok(record) => Some(record),
        Err(err) => {
            warn!("Skipping a {} row the sheet returned in an unreadable shape: {}", kind, err);
            None
        }
    }
}

/// Straightens out the shapes a raw sheet row can take before it is
/// decoded: time cells to HH:MM, date cells to YYYY-MM-DD, plus the
/// derived DD-MM-YYYY `displayDate`. Cells the parsers reject are left
/// exactly as they came.
fn post_process_appointment_row(mut row: Value) -> Value {
    if let Some(record) = row.as_object_mut() {
        if let Some(time) = record.get("time") {
            let normalized = normalize_time(time).unwrap_or_else(|_| stringify_cell(time));
            record.insert("time".to_string(), Value::String(normalized));
        }

        let raw_date = record.get("date").map(stringify_cell).unwrap_or_default();
        let date = normalize_backend_date(&raw_date).unwrap_or(raw_date);
        let display = to_display_date(&date).unwrap_or_else(|_| date.clone());
        record.insert("date".to_string(), Value::String(date));
        record.insert("displayDate".to_string(), Value::String(display));
    }
    row
}

fn stringify_cell(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
