use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;

use shared_config::AppConfig;
use shared_models::auth::{Role, SessionUser};

pub struct TestConfig {
    pub sheets_script_url: String,
    pub session_secret: String,
    pub clinic_open_hour: u32,
    pub clinic_close_hour: u32,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            sheets_script_url: "http://localhost:9999/exec".to_string(),
            session_secret: "test-secret-key-for-session-tokens-long-enough".to_string(),
            clinic_open_hour: 9,
            clinic_close_hour: 18,
        }
    }
}

impl TestConfig {
    /// Points the gateway at a mock server.
    pub fn with_script_url(url: &str) -> Self {
        Self {
            sheets_script_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            sheets_script_url: self.sheets_script_url.clone(),
            session_secret: self.session_secret.clone(),
            clinic_open_hour: self.clinic_open_hour,
            clinic_close_hour: self.clinic_close_hour,
            port: 0,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub role: Role,
    pub doctor_name: Option<String>,
}

impl TestUser {
    pub fn nurse(id: &str) -> Self {
        Self {
            id: id.to_string(),
            role: Role::Nurse,
            doctor_name: None,
        }
    }

    pub fn doctor(id: &str, doctor_name: &str) -> Self {
        Self {
            id: id.to_string(),
            role: Role::Doctor,
            doctor_name: Some(doctor_name.to_string()),
        }
    }

    pub fn head_doctor(id: &str, doctor_name: &str) -> Self {
        Self {
            id: id.to_string(),
            role: Role::HeadDoctor,
            doctor_name: Some(doctor_name.to_string()),
        }
    }

    pub fn to_session_user(&self) -> SessionUser {
        SessionUser {
            id: self.id.clone(),
            role: self.role,
            doctor_name: self.doctor_name.clone(),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let mut payload = json!({
            "sub": user.id,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });
        if let Some(doctor_name) = &user.doctor_name {
            payload["doctorName"] = json!(doctor_name);
        }

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Canned bodies in the shapes the sheet script actually answers with.
pub struct MockSheetResponses;

impl MockSheetResponses {
    pub fn login_success(user: &TestUser) -> Value {
        let mut body = json!({
            "success": true,
            "user": {
                "id": user.id,
                "role": user.role
            }
        });
        if let Some(doctor_name) = &user.doctor_name {
            body["user"]["doctorName"] = json!(doctor_name);
        }
        body
    }

    pub fn login_failure(message: &str) -> Value {
        json!({
            "success": false,
            "error": message
        })
    }

    pub fn appointment_row(id: &str, doctor: &str, date: &str, time: &str) -> Value {
        json!({
            "id": id,
            "patientName": "Test Patient",
            "phone": "9800000001",
            "date": date,
            "time": time,
            "doctor": doctor,
            "status": "Scheduled",
            "notes": "",
            "createdBy": "nurse1"
        })
    }

    pub fn patient_row(id: &str, name: &str, phone: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "phone": phone,
            "gender": "F",
            "dob": "01-01-1990",
            "googleDocLink": ""
        })
    }

    pub fn staff_row(id: &str, role: &str, doctor_name: &str) -> Value {
        json!({
            "id": id,
            "role": role,
            "doctorName": doctor_name,
            "status": "active"
        })
    }

    pub fn appointments(rows: Vec<Value>) -> Value {
        json!({ "success": true, "appointments": rows })
    }

    pub fn patients(rows: Vec<Value>) -> Value {
        json!({ "success": true, "patients": rows })
    }

    pub fn doctors(rows: Vec<Value>) -> Value {
        json!({ "success": true, "doctors": rows })
    }

    /// `{ "success": true, "<kind>": row }`, e.g. an echoed created record.
    pub fn created(kind: &str, row: Value) -> Value {
        let mut body = serde_json::Map::new();
        body.insert("success".to_string(), Value::Bool(true));
        body.insert(kind.to_string(), row);
        Value::Object(body)
    }

    pub fn ok() -> Value {
        json!({ "success": true })
    }

    pub fn failure(message: &str) -> Value {
        json!({ "success": false, "error": message })
    }

    pub fn broken_deployment_html() -> String {
        "<!DOCTYPE html><html><body>Authorization needed</body></html>".to_string()
    }
}
