use std::sync::Arc;

use tracing::{debug, info, warn};

use shared_database::AppointmentPatch;
use shared_models::auth::SessionUser;
use shared_state::AppState;
use shared_utils::dates::{normalize_time_text, to_backend_date, to_display_date};

use crate::models::{BookingError, UpdateAppointmentRequest};

/// Status flips, note edits, reschedules and deletions. Every mutation
/// writes upstream first; the cached board is only touched afterwards.
pub struct LifecycleService {
    state: Arc<AppState>,
}

impl LifecycleService {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    pub async fn update(
        &self,
        user: &SessionUser,
        id: &str,
        request: UpdateAppointmentRequest,
    ) -> Result<(), BookingError> {
        let date = match request.date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(display) => Some(
                to_backend_date(display).map_err(|err| BookingError::Validation(err.to_string()))?,
            ),
        };
        let time = match request.time.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                normalize_time_text(raw).map_err(|err| BookingError::Validation(err.to_string()))?,
            ),
        };

        let patch = AppointmentPatch {
            status: request.status,
            notes: request.notes,
            date,
            time,
            updated_by: Some(user.id.clone()),
        };
        if patch.status.is_none()
            && patch.notes.is_none()
            && patch.date.is_none()
            && patch.time.is_none()
        {
            return Err(BookingError::Validation("Nothing to update".to_string()));
        }

        self.state.sheets.update_appointment(id, &patch).await?;
        info!("Appointment {} updated by {}", id, user.id);

        let applied = patch.clone();
        let updated_by = user.id.clone();
        let known = self
            .state
            .store
            .patch_appointment(id, move |apt| {
                if let Some(status) = applied.status {
                    apt.status = status;
                }
                if let Some(notes) = applied.notes {
                    apt.notes = notes;
                }
                if let Some(date) = applied.date {
                    apt.display_date = to_display_date(&date).unwrap_or_else(|_| date.clone());
                    apt.date = date;
                }
                if let Some(time) = applied.time {
                    apt.time = time;
                }
                apt.updated_by = updated_by;
            })
            .await;
        if !known {
            debug!("Appointment {} was not cached; the reconcile will pick it up", id);
        }

        if let Err(err) = self.state.refresh_appointments().await {
            warn!("Post-update reconcile failed: {}", err);
        }
        Ok(())
    }

    pub async fn delete(&self, user: &SessionUser, id: &str) -> Result<(), BookingError> {
        self.state.sheets.delete_appointment(id).await?;
        info!("Appointment {} deleted by {}", id, user.id);

        self.state.store.remove_appointment(id).await;
        if let Err(err) = self.state.refresh_appointments().await {
            warn!("Post-delete reconcile failed: {}", err);
        }
        Ok(())
    }
}
