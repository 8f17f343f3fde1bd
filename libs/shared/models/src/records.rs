use std::fmt;

use serde::{Deserialize, Serialize};

// Rows coming back from the sheet script are only as well-formed as the
// spreadsheet behind it, so every text field tolerates being absent.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Arrived,
    NotComing,
    Completed,
}

impl AppointmentStatus {
    /// A slot is still occupied unless the patient called off.
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::NotComing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "Scheduled",
            AppointmentStatus::Arrived => "Arrived",
            AppointmentStatus::NotComing => "NotComing",
            AppointmentStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub patient_name: String,
    #[serde(default)]
    pub phone: String,
    /// Stored as YYYY-MM-DD.
    #[serde(default)]
    pub date: String,
    /// Derived DD-MM-YYYY view of `date`, attached when rows are read.
    #[serde(default)]
    pub display_date: String,
    /// Normalized to HH:MM.
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub doctor: String,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub updated_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Phone doubles as the lookup key when booking for an existing patient.
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub google_doc_link: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffStatus {
    #[default]
    Active,
    Inactive,
}

impl StaffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffStatus::Active => "active",
            StaffStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for StaffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A staff account row. Accounts are deactivated rather than deleted so
/// the audit trail on old appointments keeps resolving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffUser {
    #[serde(default)]
    pub id: String,
    /// Never serialized back out; the sheet is the only place it lives.
    #[serde(default, skip_serializing)]
    pub password: String,
    pub role: super::auth::Role,
    #[serde(default)]
    pub doctor_name: String,
    #[serde(default)]
    pub status: StaffStatus,
}
