use std::sync::Arc;

use tracing::{debug, info, warn};

use shared_database::{NewPatient, PatientPatch};
use shared_models::records::Patient;
use shared_state::AppState;

use crate::models::{CreatePatientRequest, PatientError, UpdatePatientRequest};

/// Search terms shorter than this answer empty without a round trip.
pub const MIN_SEARCH_LEN: usize = 3;

pub struct PatientService {
    state: Arc<AppState>,
}

impl PatientService {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    pub async fn list(&self) -> Vec<Patient> {
        self.state.store.patients().await
    }

    /// The booking form's live search. Long enough terms are a fresh
    /// scoped read against the sheet, not a cache scan, so the picker
    /// sees rows other stations registered minutes ago.
    pub async fn search(&self, term: &str) -> Result<Vec<Patient>, PatientError> {
        let term = term.trim();
        if term.chars().count() < MIN_SEARCH_LEN {
            debug!("Search term below threshold, answering empty");
            return Ok(Vec::new());
        }
        Ok(self.state.sheets.fetch_patients(Some(term)).await?)
    }

    pub async fn create(
        &self,
        request: CreatePatientRequest,
    ) -> Result<Option<Patient>, PatientError> {
        let name = request.name.trim().to_string();
        let phone = request.phone.trim().to_string();
        if name.is_empty() || phone.is_empty() {
            return Err(PatientError::Validation(
                "Patient name and phone are required".to_string(),
            ));
        }
        if self.state.store.find_patient_by_phone(&phone).await.is_some() {
            return Err(PatientError::DuplicatePhone(phone));
        }

        let new = NewPatient {
            name,
            phone,
            gender: request.gender.trim().to_string(),
            dob: request.dob.trim().to_string(),
            google_doc_link: request.google_doc_link.trim().to_string(),
        };
        let echoed = self.state.sheets.create_patient(&new).await?;
        info!("Registered patient {} ({})", new.name, new.phone);

        if let Some(patient) = &echoed {
            self.state.store.apply_created_patient(patient.clone()).await;
        }
        if let Err(err) = self.state.refresh_patients().await {
            warn!("Post-create reconcile failed: {}", err);
        }
        Ok(echoed)
    }

    pub async fn update(
        &self,
        id: &str,
        request: UpdatePatientRequest,
    ) -> Result<(), PatientError> {
        let patch = PatientPatch {
            name: request.name,
            phone: request.phone,
            gender: request.gender,
            dob: request.dob,
            google_doc_link: request.google_doc_link,
        };
        if patch.name.is_none()
            && patch.phone.is_none()
            && patch.gender.is_none()
            && patch.dob.is_none()
            && patch.google_doc_link.is_none()
        {
            return Err(PatientError::Validation("Nothing to update".to_string()));
        }

        self.state.sheets.update_patient(id, &patch).await?;
        info!("Updated patient {}", id);

        let applied = patch.clone();
        self.state
            .store
            .patch_patient(id, move |patient| {
                if let Some(name) = applied.name {
                    patient.name = name;
                }
                if let Some(phone) = applied.phone {
                    patient.phone = phone;
                }
                if let Some(gender) = applied.gender {
                    patient.gender = gender;
                }
                if let Some(dob) = applied.dob {
                    patient.dob = dob;
                }
                if let Some(google_doc_link) = applied.google_doc_link {
                    patient.google_doc_link = google_doc_link;
                }
            })
            .await;

        if let Err(err) = self.state.refresh_patients().await {
            warn!("Post-update reconcile failed: {}", err);
        }
        Ok(())
    }
}
