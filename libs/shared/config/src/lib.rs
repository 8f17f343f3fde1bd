use std::env;

use thiserror::Error;
use tracing::info;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_OPEN_HOUR: u32 = 9;
pub const DEFAULT_CLOSE_HOUR: u32 = 18;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Deployed Apps Script web-app URL the clinic sheet lives behind.
    pub sheets_script_url: String,
    /// HMAC secret for session tokens.
    pub session_secret: String,
    pub clinic_open_hour: u32,
    pub clinic_close_hour: u32,
    pub port: u16,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SHEETS_SCRIPT_URL is not set")]
    MissingScriptUrl,

    #[error("SHEETS_SCRIPT_URL still contains the placeholder value: {0}")]
    PlaceholderScriptUrl(String),

    #[error("SHEETS_SCRIPT_URL must be an absolute http(s) URL, got: {0}")]
    InvalidScriptUrl(String),

    #[error("SESSION_SECRET is not set")]
    MissingSessionSecret,

    #[error("{name} is not a valid number: {value}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("clinic hours are inverted: open {open} is not before close {close}")]
    InvalidClinicHours { open: u32, close: u32 },
}

impl AppConfig {
    /// Reads configuration from the environment. A misconfigured deployment
    /// refuses to start instead of limping along and answering every
    /// request with a connection error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let sheets_script_url = validate_script_url(env::var("SHEETS_SCRIPT_URL").ok())?;

        let session_secret = env::var("SESSION_SECRET")
            .ok()
            .filter(|secret| !secret.trim().is_empty())
            .ok_or(ConfigError::MissingSessionSecret)?;

        let clinic_open_hour = parse_number("CLINIC_OPEN_HOUR", DEFAULT_OPEN_HOUR)?;
        let clinic_close_hour = parse_number("CLINIC_CLOSE_HOUR", DEFAULT_CLOSE_HOUR)?;
        if clinic_open_hour >= clinic_close_hour {
            return Err(ConfigError::InvalidClinicHours {
                open: clinic_open_hour,
                close: clinic_close_hour,
            });
        }

        let port = parse_number("PORT", DEFAULT_PORT)?;

        info!(
            "Configuration loaded, clinic hours {:02}:00-{:02}:00",
            clinic_open_hour, clinic_close_hour
        );

        Ok(Self {
            sheets_script_url,
            session_secret,
            clinic_open_hour,
            clinic_close_hour,
            port,
        })
    }
}

fn validate_script_url(raw: Option<String>) -> Result<String, ConfigError> {
    let url = raw.map(|u| u.trim().to_string()).unwrap_or_default();
    if url.is_empty() {
        return Err(ConfigError::MissingScriptUrl);
    }
    // Fresh checkouts ship `SHEETS_SCRIPT_URL=YOUR_SCRIPT_URL_HERE`.
    if url.to_ascii_uppercase().contains("YOUR_") {
        return Err(ConfigError::PlaceholderScriptUrl(url));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::InvalidScriptUrl(url));
    }
    Ok(url)
}

fn parse_number<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
            name,
            value,
        }),
        Err(_) => Ok(default),
    }
}
