use std::fmt;

use serde::{Deserialize, Serialize};

/// Staff roles as stored in the users sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Nurse,
    Doctor,
    HeadDoctor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Nurse => "nurse",
            Role::Doctor => "doctor",
            Role::HeadDoctor => "head-doctor",
        }
    }

    /// Roles that have their own appointment column, i.e. can be booked.
    pub fn is_doctor_capable(&self) -> bool {
        matches!(self, Role::Doctor | Role::HeadDoctor)
    }

    /// Nurses and the head doctor see the whole schedule; doctors only
    /// see their own.
    pub fn sees_all_appointments(&self) -> bool {
        matches!(self, Role::Nurse | Role::HeadDoctor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identity minted into a session token at login and recovered from
/// it on every authenticated request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub sub: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
    pub iat: i64,
    pub exp: i64,
}
