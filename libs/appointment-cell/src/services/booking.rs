use std::sync::Arc;

use tracing::{info, warn};

use shared_database::{NewAppointment, NewPatient};
use shared_models::auth::{Role, SessionUser};
use shared_models::records::{Appointment, AppointmentStatus};
use shared_state::AppState;
use shared_utils::dates::{normalize_time_text, to_backend_date};

use crate::models::{BookingError, CreateAppointmentRequest};

/// Walks a booking through validation, doctor resolution, the local
/// double-booking guard, patient create-on-demand and the upstream write,
/// in that order. Nothing goes on the wire until the local checks pass.
pub struct BookingService {
    state: Arc<AppState>,
}

impl BookingService {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    pub async fn book(
        &self,
        user: &SessionUser,
        request: CreateAppointmentRequest,
    ) -> Result<Option<Appointment>, BookingError> {
        let patient_name = request.patient_name.trim().to_string();
        let phone = request.phone.trim().to_string();
        if patient_name.is_empty() || phone.is_empty() {
            return Err(BookingError::Validation(
                "Patient name and phone are required".to_string(),
            ));
        }

        let display_date = request.date.trim().to_string();
        let raw_time = request.time.trim();
        if display_date.is_empty() || raw_time.is_empty() {
            return Err(BookingError::Validation(
                "Appointment date and time are required".to_string(),
            ));
        }

        let doctor = resolve_doctor(user, request.doctor.trim())?;
        let date = to_backend_date(&display_date)
            .map_err(|err| BookingError::Validation(err.to_string()))?;
        let time = normalize_time_text(raw_time)
            .map_err(|err| BookingError::Validation(err.to_string()))?;

        // The guard runs against the cached board before anything goes
        // upstream. Advisory only; the sheet never enforces uniqueness.
        if let Some(taken) = self
            .state
            .store
            .find_slot_conflict(&doctor, &date, &time)
            .await
        {
            info!(
                "Rejected booking: {} {} {} already holds appointment {}",
                doctor, date, time, taken.id
            );
            return Err(BookingError::SlotTaken {
                doctor,
                date: display_date,
                time,
            });
        }

        self.ensure_patient(&patient_name, &phone, &request).await?;

        let new = NewAppointment {
            patient_name,
            phone,
            date,
            time,
            doctor,
            status: AppointmentStatus::Scheduled,
            notes: request.notes.trim().to_string(),
            created_by: user.id.clone(),
            gender: request.gender.trim().to_string(),
            dob: request.dob.trim().to_string(),
        };
        let echoed = self.state.sheets.create_appointment(&new).await?;
        info!(
            "Booked {} with {} on {} at {}",
            new.patient_name, new.doctor, new.date, new.time
        );

        if let Some(appointment) = &echoed {
            self.state
                .store
                .apply_created_appointment(appointment.clone())
                .await;
        }
        if let Err(err) = self.state.refresh_appointments().await {
            warn!("Post-booking reconcile failed: {}", err);
        }

        Ok(echoed)
    }

    /// Booking for a phone the clinic has never seen registers the patient
    /// first, so the sheet keeps one row per person.
    async fn ensure_patient(
        &self,
        name: &str,
        phone: &str,
        request: &CreateAppointmentRequest,
    ) -> Result<(), BookingError> {
        if self.state.store.find_patient_by_phone(phone).await.is_some() {
            return Ok(());
        }

        let new = NewPatient {
            name: name.to_string(),
            phone: phone.to_string(),
            gender: request.gender.trim().to_string(),
            dob: request.dob.trim().to_string(),
            google_doc_link: String::new(),
        };
        let echoed = self.state.sheets.create_patient(&new).await?;
        info!("Registered new patient {} ({})", name, phone);

        if let Some(patient) = echoed {
            self.state.store.apply_created_patient(patient).await;
        }
        Ok(())
    }
}

/// Which column the appointment lands in. Doctors always book into their
/// own; the head doctor defaults to their own when the form leaves the
/// dropdown empty; nurses must pick one.
fn resolve_doctor(user: &SessionUser, requested: &str) -> Result<String, BookingError> {
    let own = || {
        user.doctor_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                BookingError::Validation(
                    "No doctor name is linked to this account".to_string(),
                )
            })
    };

    match user.role {
        Role::Doctor => own(),
        Role::HeadDoctor if requested.is_empty() => own(),
        Role::HeadDoctor => Ok(requested.to_string()),
        Role::Nurse if requested.is_empty() => Err(BookingError::Validation(
            "Please select a doctor".to_string(),
        )),
        Role::Nurse => Ok(requested.to_string()),
    }
}
