pub mod store;

use std::sync::Arc;

use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::{SheetsClient, SheetsError};

pub use store::DataStore;

/// Everything a handler needs, threaded through the routers as
/// `Arc<AppState>`. The config keeps its own `Arc` so the auth middleware
/// can take it without dragging the rest of the state along.
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sheets: SheetsClient,
    pub store: DataStore,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let sheets = SheetsClient::new(&config);
        Self {
            config: Arc::new(config),
            sheets,
            store: DataStore::default(),
        }
    }

    /// One round trip per sheet, in parallel, then the collections are
    /// swapped wholesale. This is the authoritative reconciliation that
    /// follows every optimistic local write.
    pub async fn refresh_all(&self) -> Result<(), SheetsError> {
        let (appointments, patients, staff) = tokio::try_join!(
            self.sheets.fetch_appointments(),
            self.sheets.fetch_patients(None),
            self.sheets.fetch_staff(),
        )?;
        info!(
            "Refreshed stores: {} appointments, {} patients, {} staff",
            appointments.len(),
            patients.len(),
            staff.len()
        );
        self.store.replace_appointments(appointments).await;
        self.store.replace_patients(patients).await;
        self.store.replace_staff(staff).await;
        Ok(())
    }

    /// Authoritative re-read of one sheet, used to reconcile after a
    /// mutation against that sheet.
    pub async fn refresh_appointments(&self) -> Result<(), SheetsError> {
        let appointments = self.sheets.fetch_appointments().await?;
        debug!("Reconciled {} appointments", appointments.len());
        self.store.replace_appointments(appointments).await;
        Ok(())
    }

    pub async fn refresh_patients(&self) -> Result<(), SheetsError> {
        let patients = self.sheets.fetch_patients(None).await?;
        debug!("Reconciled {} patients", patients.len());
        self.store.replace_patients(patients).await;
        Ok(())
    }

    pub async fn refresh_staff(&self) -> Result<(), SheetsError> {
        let staff = self.sheets.fetch_staff().await?;
        debug!("Reconciled {} staff users", staff.len());
        self.store.replace_staff(staff).await;
        Ok(())
    }
}
