use std::sync::Arc;

use shared_models::auth::SessionUser;
use shared_models::records::{Appointment, AppointmentStatus};
use shared_state::AppState;
use shared_utils::calendar::month_grid;
use shared_utils::dates::{generate_time_slots, today_backend, ClinicHours};

use crate::models::{
    AppointmentListQuery, BookingError, CalendarDay, CalendarMonth, CalendarQuery, UpcomingQuery,
};

/// Read-side views over the cached board. Everything here is served from
/// memory; the refresh cycle keeps it honest.
pub struct ScheduleService {
    state: Arc<AppState>,
}

impl ScheduleService {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    pub async fn list(
        &self,
        user: &SessionUser,
        query: &AppointmentListQuery,
    ) -> Vec<Appointment> {
        let mut appointments = self.state.store.visible_appointments(user).await;
        if !query.include_not_coming {
            appointments.retain(|apt| apt.status != AppointmentStatus::NotComing);
        }
        if let Some(date) = query.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            appointments.retain(|apt| apt.date == date);
        }
        appointments
    }

    /// Today onwards, soonest first. Called-off appointments are not
    /// upcoming anything.
    pub async fn upcoming(&self, user: &SessionUser, query: &UpcomingQuery) -> Vec<Appointment> {
        let today = today_backend();
        let mut appointments = self.state.store.visible_appointments(user).await;
        appointments
            .retain(|apt| apt.status != AppointmentStatus::NotComing && apt.date >= today);
        appointments.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.time.cmp(&b.time)));
        if let Some(limit) = query.limit {
            appointments.truncate(limit);
        }
        appointments
    }

    pub async fn calendar(
        &self,
        user: &SessionUser,
        query: &CalendarQuery,
    ) -> Result<CalendarMonth, BookingError> {
        let grid = month_grid(query.year, query.month)
            .map_err(|err| BookingError::Validation(err.to_string()))?;
        let appointments = self.state.store.visible_appointments(user).await;

        let weeks = grid
            .into_iter()
            .map(|week| {
                week.into_iter()
                    .map(|cell| cell.map(|day| day_entry(query, day, &appointments)))
                    .collect()
            })
            .collect();
        Ok(CalendarMonth {
            year: query.year,
            month: query.month,
            weeks,
        })
    }

    pub fn slots(&self) -> Vec<String> {
        generate_time_slots(&ClinicHours::from_config(&self.state.config))
    }
}

fn day_entry(query: &CalendarQuery, day: u32, appointments: &[Appointment]) -> CalendarDay {
    let date = format!("{:04}-{:02}-{:02}", query.year, query.month + 1, day);
    let mut todays: Vec<Appointment> = appointments
        .iter()
        .filter(|apt| apt.date == date)
        .cloned()
        .collect();
    todays.sort_by(|a, b| a.time.cmp(&b.time));
    CalendarDay {
        day,
        date,
        appointments: todays,
    }
}
