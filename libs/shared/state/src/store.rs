use tokio::sync::RwLock;

use shared_models::auth::SessionUser;
use shared_models::records::{Appointment, Patient, StaffUser};

/// In-memory mirror of the three sheets. Handlers read from here; writes
/// go upstream first and are applied here optimistically until the next
/// refresh replaces the whole collection.
#[derive(Default)]
pub struct DataStore {
    appointments: RwLock<Vec<Appointment>>,
    patients: RwLock<Vec<Patient>>,
    staff: RwLock<Vec<StaffUser>>,
}

impl DataStore {
    // ---- appointments ----

    pub async fn replace_appointments(&self, records: Vec<Appointment>) {
        *self.appointments.write().await = records;
    }

    pub async fn appointments(&self) -> Vec<Appointment> {
        self.appointments.read().await.clone()
    }

    /// Doctors only see their own column; nurses and the head doctor see
    /// the whole board.
    pub async fn visible_appointments(&self, user: &SessionUser) -> Vec<Appointment> {
        let appointments = self.appointments.read().await;
        if user.role.sees_all_appointments() {
            return appointments.clone();
        }
        // A doctor session without a linked name owns no column.
        let own_name = match user.doctor_name.as_deref() {
            Some(name) => name,
            None => return Vec::new(),
        };
        appointments
            .iter()
            .filter(|apt| apt.doctor == own_name)
            .cloned()
            .collect()
    }

    /// The local double-booking check. A slot is occupied when the same
    /// doctor, date and time sit on any appointment that still counts;
    /// a NotComing row frees its slot.
    pub async fn find_slot_conflict(
        &self,
        doctor: &str,
        date: &str,
        time: &str,
    ) -> Option<Appointment> {
        self.appointments
            .read()
            .await
            .iter()
            .find(|apt| {
                apt.status.occupies_slot()
                    && apt.doctor == doctor
                    && apt.date == date
                    && apt.time == time
            })
            .cloned()
    }

    pub async fn apply_created_appointment(&self, appointment: Appointment) {
        self.appointments.write().await.push(appointment);
    }

    /// Optimistic in-place edit; false when the id is unknown locally.
    pub async fn patch_appointment<F>(&self, id: &str, patch: F) -> bool
    where
        F: FnOnce(&mut Appointment),
    {
        let mut appointments = self.appointments.write().await;
        match appointments.iter_mut().find(|apt| apt.id == id) {
            Some(appointment) => {
                patch(appointment);
                true
            }
            None => false,
        }
    }

    pub async fn remove_appointment(&self, id: &str) -> bool {
        let mut appointments = self.appointments.write().await;
        let before = appointments.len();
        appointments.retain(|apt| apt.id != id);
        appointments.len() != before
    }

    // ---- patients ----

    pub async fn replace_patients(&self, records: Vec<Patient>) {
        *self.patients.write().await = records;
    }

    pub async fn patients(&self) -> Vec<Patient> {
        self.patients.read().await.clone()
    }

    /// Phone is the natural key for "have we seen this patient before".
    pub async fn find_patient_by_phone(&self, phone: &str) -> Option<Patient> {
        let phone = phone.trim();
        self.patients
            .read()
            .await
            .iter()
            .find(|patient| patient.phone.trim() == phone)
            .cloned()
    }

    pub async fn apply_created_patient(&self, patient: Patient) {
        self.patients.write().await.push(patient);
    }

    pub async fn patch_patient<F>(&self, id: &str, patch: F) -> bool
    where
        F: FnOnce(&mut Patient),
    {
        let mut patients = self.patients.write().await;
        match patients.iter_mut().find(|patient| patient.id == id) {
            Some(patient) => {
                patch(patient);
                true
            }
            None => false,
        }
    }

    // ---- staff ----

    pub async fn replace_staff(&self, records: Vec<StaffUser>) {
        *self.staff.write().await = records;
    }

    pub async fn staff(&self) -> Vec<StaffUser> {
        self.staff.read().await.clone()
    }

    pub async fn apply_created_staff(&self, user: StaffUser) {
        self.staff.write().await.push(user);
    }

    pub async fn patch_staff<F>(&self, id: &str, patch: F) -> bool
    where
        F: FnOnce(&mut StaffUser),
    {
        let mut staff = self.staff.write().await;
        match staff.iter_mut().find(|user| user.id == id) {
            Some(user) => {
                patch(user);
                true
            }
            None => false,
        }
    }
}
