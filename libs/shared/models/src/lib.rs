pub mod auth;
pub mod error;
pub mod records;

pub use auth::{Role, SessionClaims, SessionUser};
pub use error::AppError;
pub use records::{Appointment, AppointmentStatus, Patient, StaffStatus, StaffUser};
