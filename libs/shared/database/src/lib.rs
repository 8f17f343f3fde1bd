pub mod sheets;

pub use sheets::{
    AppointmentPatch, NewAppointment, NewPatient, NewStaff, PatientPatch, SheetsClient,
    SheetsError, StaffPatch,
};
