use chrono::{DateTime, Local, NaiveDateTime};
use serde_json::Value;
use thiserror::Error;

use shared_config::{AppConfig, DEFAULT_CLOSE_HOUR, DEFAULT_OPEN_HOUR};

// The sheet stores dates as YYYY-MM-DD while staff read and type them as
// DD-MM-YYYY. Both conversions are a plain segment swap.

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateError {
    #[error("expected a DD-MM-YYYY date, got: {0}")]
    BadDisplayDate(String),

    #[error("expected a YYYY-MM-DD date, got: {0}")]
    BadBackendDate(String),

    #[error("unrecognized time value: {0}")]
    BadTime(String),

    #[error("month index out of range: {0}")]
    BadMonth(u32),
}

/// DD-MM-YYYY as typed by staff into YYYY-MM-DD as stored in the sheet.
pub fn to_backend_date(display: &str) -> Result<String, DateError> {
    swap_date_segments(display).ok_or_else(|| DateError::BadDisplayDate(display.to_string()))
}

/// YYYY-MM-DD as stored in the sheet into DD-MM-YYYY for the clinic staff.
pub fn to_display_date(backend: &str) -> Result<String, DateError> {
    swap_date_segments(backend).ok_or_else(|| DateError::BadBackendDate(backend.to_string()))
}

fn swap_date_segments(value: &str) -> Option<String> {
    let parts: Vec<&str> = value.trim().split('-').collect();
    if parts.len() != 3 || parts.iter().any(|part| part.is_empty()) {
        return None;
    }
    Some(format!("{}-{}-{}", parts[2], parts[1], parts[0]))
}

/// The same swaps under the names the date-picker interop uses; HTML
/// `<input type="date">` values are ISO YYYY-MM-DD.
pub fn iso_to_display_date(iso: &str) -> Result<String, DateError> {
    to_display_date(iso)
}

pub fn display_to_iso_date(display: &str) -> Result<String, DateError> {
    to_backend_date(display)
}

/// Date cells sometimes come back from the sheet as full ISO timestamps
/// rather than bare dates. This trims them to YYYY-MM-DD textually, with
/// no timezone conversion.
pub fn normalize_backend_date(raw: &str) -> Result<String, DateError> {
    let trimmed = raw.trim();
    let date_part = trimmed.split('T').next().unwrap_or(trimmed);
    let parts: Vec<&str> = date_part.split('-').collect();
    if parts.len() != 3 || parts.iter().any(|part| part.is_empty()) {
        return Err(DateError::BadBackendDate(raw.to_string()));
    }
    Ok(date_part.to_string())
}

/// Time cells arrive as "HH:MM", "HH:MM:SS", full ISO timestamps, or raw
/// spreadsheet day fractions (0.5 is noon). Everything is reduced to HH:MM.
/// An empty string stays empty; it means the column was blank.
pub fn normalize_time(value: &Value) -> Result<String, DateError> {
    match value {
        Value::String(raw) => normalize_time_text(raw),
        Value::Number(number) => number
            .as_f64()
            .map(day_fraction_to_time)
            .ok_or_else(|| DateError::BadTime(number.to_string())),
        other => Err(DateError::BadTime(other.to_string())),
    }
}

/// The same reduction for time values already known to be text, such as
/// the booking form's slot field.
pub fn normalize_time_text(raw: &str) -> Result<String, DateError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }

    if trimmed.contains('T') {
        // Keep the wall-clock time exactly as written in the cell.
        if let Ok(stamp) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(stamp.format("%H:%M").to_string());
        }
        if let Ok(stamp) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(stamp.format("%H:%M").to_string());
        }
        return Err(DateError::BadTime(trimmed.to_string()));
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() != 2 && parts.len() != 3 {
        return Err(DateError::BadTime(trimmed.to_string()));
    }
    let hour: u32 = parts[0]
        .trim()
        .parse()
        .map_err(|_| DateError::BadTime(trimmed.to_string()))?;
    let minute: u32 = parts[1]
        .trim()
        .parse()
        .map_err(|_| DateError::BadTime(trimmed.to_string()))?;
    // Re-pad only. Out-of-range values pass through untouched, the sheet
    // is the source of truth for what was booked.
    Ok(format!("{:02}:{:02}", hour, minute))
}

fn day_fraction_to_time(fraction: f64) -> String {
    let total_minutes = (fraction * 24.0 * 60.0).round() as i64;
    let minutes = total_minutes.rem_euclid(24 * 60);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Booking hours for slot generation. Defaults match the clinic's
/// 09:00 to 18:00 day.
#[derive(Debug, Clone, Copy)]
pub struct ClinicHours {
    pub open_hour: u32,
    pub close_hour: u32,
}

impl ClinicHours {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            open_hour: config.clinic_open_hour,
            close_hour: config.clinic_close_hour,
        }
    }
}

impl Default for ClinicHours {
    fn default() -> Self {
        Self {
            open_hour: DEFAULT_OPEN_HOUR,
            close_hour: DEFAULT_CLOSE_HOUR,
        }
    }
}

/// Quarter-hour booking slots across the clinic day. The closing hour
/// itself is offered ("18:00") but nothing past it ("18:15" is not).
pub fn generate_time_slots(hours: &ClinicHours) -> Vec<String> {
    let mut slots = Vec::new();
    for hour in hours.open_hour..=hours.close_hour {
        for minute in (0u32..60).step_by(15) {
            if hour == hours.close_hour && minute > 0 {
                break;
            }
            slots.push(format!("{:02}:{:02}", hour, minute));
        }
    }
    slots
}

/// Today in DD-MM-YYYY, for prefilled booking forms.
pub fn today_display() -> String {
    Local::now().format("%d-%m-%Y").to_string()
}

/// Today in YYYY-MM-DD, for comparisons against stored dates.
pub fn today_backend() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Today in the form date inputs expect. Same shape as the backend date.
pub fn today_iso() -> String {
    today_backend()
}
