use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use shared_models::auth::{SessionClaims, SessionUser};

type HmacSha256 = Hmac<Sha256>;

/// Sessions live for a week; clinic machines stay logged in across shifts.
pub const SESSION_TTL_DAYS: i64 = 7;

pub fn create_session_token(user: &SessionUser, secret: &str) -> Result<String, String> {
    if secret.is_empty() {
        return Err("Session secret is not set".to_string());
    }

    let now = Utc::now();
    let claims = SessionClaims {
        sub: user.id.clone(),
        role: user.role,
        doctor_name: user.doctor_name.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::days(SESSION_TTL_DAYS)).timestamp(),
    };

    let claims_json =
        serde_json::to_string(&claims).map_err(|e| format!("Failed to encode claims: {}", e))?;

    let header_b64 = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let claims_b64 = URL_SAFE_NO_PAD.encode(claims_json);
    let signing_input = format!("{}.{}", header_b64, claims_b64);

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(signing_input.as_bytes());
    let signature_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", signing_input, signature_b64))
}

pub fn validate_session_token(token: &str, secret: &str) -> Result<SessionUser, String> {
    if secret.is_empty() {
        return Err("Session secret is not set".to_string());
    }

    // Split token into parts
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Failed to decode signature: {}", e);
            return Err("Invalid signature encoding".to_string());
        }
    };

    // Verify signature
    let signing_input = format!("{}.{}", header_b64, claims_b64);
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return Err("Failed to create HMAC".to_string()),
    };
    mac.update(signing_input.as_bytes());
    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    // Decode claims
    let claims_json = match URL_SAFE_NO_PAD.decode(claims_b64) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err("Invalid claims encoding".to_string()),
        },
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    let claims: SessionClaims = match serde_json::from_str(&claims_json) {
        Ok(c) => c,
        Err(e) => {
            debug!("Failed to parse claims: {}", e);
            return Err("Invalid claims format".to_string());
        }
    };

    // Check expiration, no leeway
    let now = Utc::now().timestamp();
    if claims.exp <= now {
        debug!("Session expired at {} (now: {})", claims.exp, now);
        return Err("Session expired".to_string());
    }

    let user = SessionUser {
        id: claims.sub,
        role: claims.role,
        doctor_name: claims.doctor_name,
    };

    debug!("Session validated for user: {}", user.id);
    Ok(user)
}
