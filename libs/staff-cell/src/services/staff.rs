use std::sync::Arc;

use tracing::{info, warn};

use shared_database::{NewStaff, StaffPatch};
use shared_models::auth::{Role, SessionUser};
use shared_models::records::{StaffStatus, StaffUser};
use shared_state::AppState;

use crate::models::{CreateStaffRequest, StaffError, UpdateStaffRequest};

pub struct StaffService {
    state: Arc<AppState>,
}

impl StaffService {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Every role reads this: the booking form's doctor dropdown is
    /// driven by the same listing the head doctor manages.
    pub async fn list(&self) -> Vec<StaffUser> {
        self.state.store.staff().await
    }

    pub async fn create(
        &self,
        user: &SessionUser,
        request: CreateStaffRequest,
    ) -> Result<Option<StaffUser>, StaffError> {
        require_head_doctor(user)?;

        let id = request.id.trim().to_string();
        let password = request.password.trim().to_string();
        let role = match request.role {
            Some(role) if !id.is_empty() && !password.is_empty() => role,
            _ => {
                return Err(StaffError::Validation(
                    "Staff id, password and role are required".to_string(),
                ))
            }
        };

        let new = NewStaff {
            id,
            password,
            role,
            doctor_name: request.doctor_name.trim().to_string(),
            status: request.status.unwrap_or_default(),
        };
        let echoed = self.state.sheets.create_staff(&new).await?;
        info!("{} created staff account {} ({})", user.id, new.id, new.role);

        if let Some(created) = &echoed {
            self.state.store.apply_created_staff(created.clone()).await;
        }
        if let Err(err) = self.state.refresh_staff().await {
            warn!("Post-create reconcile failed: {}", err);
        }
        Ok(echoed)
    }

    /// Partial update; setting status to inactive is how an account is
    /// retired, there is no delete.
    pub async fn update(
        &self,
        user: &SessionUser,
        id: &str,
        request: UpdateStaffRequest,
    ) -> Result<(), StaffError> {
        require_head_doctor(user)?;

        let patch = StaffPatch {
            password: request.password,
            role: request.role,
            doctor_name: request.doctor_name,
            status: request.status,
        };
        if patch.password.is_none()
            && patch.role.is_none()
            && patch.doctor_name.is_none()
            && patch.status.is_none()
        {
            return Err(StaffError::Validation("Nothing to update".to_string()));
        }

        self.state.sheets.update_staff(id, &patch).await?;
        if patch.status == Some(StaffStatus::Inactive) {
            info!("{} deactivated staff account {}", user.id, id);
        } else {
            info!("{} updated staff account {}", user.id, id);
        }

        let applied = patch.clone();
        self.state
            .store
            .patch_staff(id, move |account| {
                if let Some(password) = applied.password {
                    account.password = password;
                }
                if let Some(role) = applied.role {
                    account.role = role;
                }
                if let Some(doctor_name) = applied.doctor_name {
                    account.doctor_name = doctor_name;
                }
                if let Some(status) = applied.status {
                    account.status = status;
                }
            })
            .await;

        if let Err(err) = self.state.refresh_staff().await {
            warn!("Post-update reconcile failed: {}", err);
        }
        Ok(())
    }
}

fn require_head_doctor(user: &SessionUser) -> Result<(), StaffError> {
    if user.role != Role::HeadDoctor {
        return Err(StaffError::NotHeadDoctor);
    }
    Ok(())
}
