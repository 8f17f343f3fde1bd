use std::sync::Arc;

use axum::extract::{Json, Path, Query, State};
use axum::Extension;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::handlers::{
    calendar_view, create_appointment, delete_appointment, list_appointments, refresh_data,
    time_slots, upcoming_appointments, update_appointment,
};
use appointment_cell::models::{
    AppointmentListQuery, CalendarQuery, CreateAppointmentRequest, UpcomingQuery,
    UpdateAppointmentRequest,
};
use shared_models::error::AppError;
use shared_models::records::{Appointment, AppointmentStatus, Patient};
use shared_state::AppState;
use shared_utils::test_utils::{MockSheetResponses, TestConfig, TestUser};

fn state_for(server: &MockServer) -> Arc<AppState> {
    Arc::new(AppState::new(
        TestConfig::with_script_url(&server.uri()).to_app_config(),
    ))
}

/// A state whose gateway points nowhere, for tests that must never leave
/// the cache.
fn offline_state() -> Arc<AppState> {
    Arc::new(AppState::new(TestConfig::default().to_app_config()))
}

fn seeded_appointment(id: &str, doctor: &str, date: &str, time: &str) -> Appointment {
    serde_json::from_value(MockSheetResponses::appointment_row(id, doctor, date, time)).unwrap()
}

fn seeded_patient(id: &str, name: &str, phone: &str) -> Patient {
    serde_json::from_value(MockSheetResponses::patient_row(id, name, phone)).unwrap()
}

fn booking(doctor: &str, date: &str, time: &str) -> CreateAppointmentRequest {
    CreateAppointmentRequest {
        patient_name: "Asha Rao".to_string(),
        phone: "9811111111".to_string(),
        date: date.to_string(),
        time: time.to_string(),
        doctor: doctor.to_string(),
        ..CreateAppointmentRequest::default()
    }
}

async fn mount_network_tripwire(server: &MockServer) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockSheetResponses::ok()))
        .expect(0)
        .mount(server)
        .await;
}

// ---- booking ----

#[tokio::test]
async fn a_taken_slot_is_rejected_before_the_network() {
    let server = MockServer::start().await;
    mount_network_tripwire(&server).await;

    let state = state_for(&server);
    state
        .store
        .replace_appointments(vec![seeded_appointment("1", "Dr. Priya", "2024-12-25", "10:30")])
        .await;

    let nurse = TestUser::nurse("nurse1").to_session_user();
    let err = create_appointment(
        State(state),
        Extension(nurse),
        Json(booking("Dr. Priya", "25-12-2024", "10:30")),
    )
    .await
    .unwrap_err();

    match err {
        AppError::Conflict(msg) => {
            assert!(msg.contains("Dr. Priya"));
            assert!(msg.contains("10:30"));
        }
        other => panic!("Expected Conflict, got {:?}", other),
    }
}

#[tokio::test]
async fn slot_times_are_normalized_before_the_guard_runs() {
    let server = MockServer::start().await;
    mount_network_tripwire(&server).await;

    let state = state_for(&server);
    state
        .store
        .replace_appointments(vec![seeded_appointment("1", "Dr. Priya", "2024-12-25", "09:00")])
        .await;

    let nurse = TestUser::nurse("nurse1").to_session_user();
    // The form sends "9:00"; the stored slot says "09:00".
    let err = create_appointment(
        State(state),
        Extension(nurse),
        Json(booking("Dr. Priya", "25-12-2024", "9:00")),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn the_same_slot_with_another_doctor_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("action=create"))
        .and(body_string_contains("type=appointments"))
        .and(body_string_contains("doctor=Dr.+Anand"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockSheetResponses::created(
            "appointment",
            MockSheetResponses::appointment_row("2", "Dr. Anand", "2024-12-25", "10:30"),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("action=read"))
        .and(body_string_contains("type=appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockSheetResponses::appointments(
            vec![
                MockSheetResponses::appointment_row("1", "Dr. Priya", "2024-12-25", "10:30"),
                MockSheetResponses::appointment_row("2", "Dr. Anand", "2024-12-25", "10:30"),
            ],
        )))
        .mount(&server)
        .await;

    let state = state_for(&server);
    state
        .store
        .replace_appointments(vec![seeded_appointment("1", "Dr. Priya", "2024-12-25", "10:30")])
        .await;
    state
        .store
        .replace_patients(vec![seeded_patient("p1", "Asha Rao", "9811111111")])
        .await;

    let nurse = TestUser::nurse("nurse1").to_session_user();
    let response = create_appointment(
        State(state.clone()),
        Extension(nurse),
        Json(booking("Dr. Anand", "25-12-2024", "10:30")),
    )
    .await
    .unwrap()
    .0;

    assert_eq!(response["success"], true);
    assert_eq!(response["appointment"]["doctor"], "Dr. Anand");
    assert_eq!(state.store.appointments().await.len(), 2);
}

#[tokio::test]
async fn unknown_phones_register_the_patient_first() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("action=create"))
        .and(body_string_contains("type=patients"))
        .and(body_string_contains("phone=9811111111"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockSheetResponses::created(
            "patient",
            MockSheetResponses::patient_row("p9", "Asha Rao", "9811111111"),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("action=create"))
        .and(body_string_contains("type=appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockSheetResponses::created(
            "appointment",
            MockSheetResponses::appointment_row("1", "Dr. Anand", "2024-12-25", "10:30"),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("action=read"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockSheetResponses::appointments(vec![])),
        )
        .mount(&server)
        .await;

    let state = state_for(&server);
    let nurse = TestUser::nurse("nurse1").to_session_user();
    let response = create_appointment(
        State(state.clone()),
        Extension(nurse),
        Json(booking("Dr. Anand", "25-12-2024", "10:30")),
    )
    .await
    .unwrap()
    .0;

    assert_eq!(response["success"], true);
    let patients = state.store.patients().await;
    assert_eq!(patients.len(), 1);
    assert_eq!(patients[0].phone, "9811111111");
}

#[tokio::test]
async fn known_phones_are_not_registered_twice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("action=create"))
        .and(body_string_contains("type=patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockSheetResponses::ok()))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("action=create"))
        .and(body_string_contains("type=appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockSheetResponses::created(
            "appointment",
            MockSheetResponses::appointment_row("1", "Dr. Anand", "2024-12-25", "10:30"),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("action=read"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockSheetResponses::appointments(vec![])),
        )
        .mount(&server)
        .await;

    let state = state_for(&server);
    state
        .store
        .replace_patients(vec![seeded_patient("p1", "Asha Rao", "9811111111")])
        .await;

    let nurse = TestUser::nurse("nurse1").to_session_user();
    let response = create_appointment(
        State(state),
        Extension(nurse),
        Json(booking("Dr. Anand", "25-12-2024", "10:30")),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(response["success"], true);
}

#[tokio::test]
async fn doctors_book_into_their_own_column() {
    let server = MockServer::start().await;
    // Whatever the form said, the row goes to the session's own doctor.
    Mock::given(method("POST"))
        .and(body_string_contains("action=create"))
        .and(body_string_contains("type=appointments"))
        .and(body_string_contains("doctor=Dr.+Priya"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockSheetResponses::created(
            "appointment",
            MockSheetResponses::appointment_row("1", "Dr. Priya", "2024-12-25", "10:30"),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("action=read"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockSheetResponses::appointments(vec![])),
        )
        .mount(&server)
        .await;

    let state = state_for(&server);
    state
        .store
        .replace_patients(vec![seeded_patient("p1", "Asha Rao", "9811111111")])
        .await;

    let doctor = TestUser::doctor("drpriya", "Dr. Priya").to_session_user();
    let response = create_appointment(
        State(state),
        Extension(doctor),
        Json(booking("Dr. Anand", "25-12-2024", "10:30")),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(response["appointment"]["doctor"], "Dr. Priya");
}

#[tokio::test]
async fn nurses_must_pick_a_doctor() {
    let server = MockServer::start().await;
    mount_network_tripwire(&server).await;

    let state = state_for(&server);
    let nurse = TestUser::nurse("nurse1").to_session_user();
    let err = create_appointment(
        State(state),
        Extension(nurse),
        Json(booking("", "25-12-2024", "10:30")),
    )
    .await
    .unwrap_err();

    match err {
        AppError::Validation(msg) => assert_eq!(msg, "Please select a doctor"),
        other => panic!("Expected Validation, got {:?}", other),
    }
}

#[tokio::test]
async fn malformed_dates_never_reach_the_network() {
    let server = MockServer::start().await;
    mount_network_tripwire(&server).await;

    let state = state_for(&server);
    let nurse = TestUser::nurse("nurse1").to_session_user();
    let err = create_appointment(
        State(state),
        Extension(nurse),
        Json(booking("Dr. Anand", "25/12/2024", "10:30")),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn upstream_rejections_surface_the_script_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("action=create"))
        .and(body_string_contains("type=appointments"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(MockSheetResponses::failure("Sheet quota exceeded")),
        )
        .mount(&server)
        .await;

    let state = state_for(&server);
    state
        .store
        .replace_patients(vec![seeded_patient("p1", "Asha Rao", "9811111111")])
        .await;

    let nurse = TestUser::nurse("nurse1").to_session_user();
    let err = create_appointment(
        State(state.clone()),
        Extension(nurse),
        Json(booking("Dr. Anand", "25-12-2024", "10:30")),
    )
    .await
    .unwrap_err();

    match err {
        AppError::BadRequest(msg) => assert_eq!(msg, "Sheet quota exceeded"),
        other => panic!("Expected BadRequest, got {:?}", other),
    }
    // A failed write leaves the board untouched.
    assert!(state.store.appointments().await.is_empty());
}

// ---- updates and deletes ----

#[tokio::test]
async fn status_updates_go_upstream_and_stick_locally() {
    let server = MockServer::start().await;
    let mut completed = MockSheetResponses::appointment_row("1", "Dr. Priya", "2024-12-25", "10:30");
    completed["status"] = json!("Completed");

    Mock::given(method("POST"))
        .and(body_string_contains("action=update"))
        .and(body_string_contains("type=appointments"))
        .and(body_string_contains("id=1"))
        .and(body_string_contains("status=Completed"))
        .and(body_string_contains("updatedBy=nurse1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockSheetResponses::ok()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("action=read"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(MockSheetResponses::appointments(vec![completed])),
        )
        .mount(&server)
        .await;

    let state = state_for(&server);
    state
        .store
        .replace_appointments(vec![seeded_appointment("1", "Dr. Priya", "2024-12-25", "10:30")])
        .await;

    let nurse = TestUser::nurse("nurse1").to_session_user();
    let response = update_appointment(
        State(state.clone()),
        Extension(nurse),
        Path("1".to_string()),
        Json(UpdateAppointmentRequest {
            status: Some(AppointmentStatus::Completed),
            ..UpdateAppointmentRequest::default()
        }),
    )
    .await
    .unwrap()
    .0;

    assert_eq!(response["success"], true);
    let board = state.store.appointments().await;
    assert_eq!(board[0].status, AppointmentStatus::Completed);
}

#[tokio::test]
async fn reschedules_convert_the_display_date() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("action=update"))
        .and(body_string_contains("date=2024-12-26"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockSheetResponses::ok()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("action=read"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockSheetResponses::appointments(vec![])),
        )
        .mount(&server)
        .await;

    let state = state_for(&server);
    let nurse = TestUser::nurse("nurse1").to_session_user();
    let response = update_appointment(
        State(state),
        Extension(nurse),
        Path("1".to_string()),
        Json(UpdateAppointmentRequest {
            date: Some("26-12-2024".to_string()),
            ..UpdateAppointmentRequest::default()
        }),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(response["success"], true);
}

#[tokio::test]
async fn empty_updates_are_rejected() {
    let server = MockServer::start().await;
    mount_network_tripwire(&server).await;

    let state = state_for(&server);
    let nurse = TestUser::nurse("nurse1").to_session_user();
    let err = update_appointment(
        State(state),
        Extension(nurse),
        Path("1".to_string()),
        Json(UpdateAppointmentRequest::default()),
    )
    .await
    .unwrap_err();

    match err {
        AppError::Validation(msg) => assert_eq!(msg, "Nothing to update"),
        other => panic!("Expected Validation, got {:?}", other),
    }
}

#[tokio::test]
async fn deleting_clears_the_local_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("action=delete"))
        .and(body_string_contains("type=appointments"))
        .and(body_string_contains("id=1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockSheetResponses::ok()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("action=read"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockSheetResponses::appointments(vec![])),
        )
        .mount(&server)
        .await;

    let state = state_for(&server);
    state
        .store
        .replace_appointments(vec![seeded_appointment("1", "Dr. Priya", "2024-12-25", "10:30")])
        .await;

    let nurse = TestUser::nurse("nurse1").to_session_user();
    let response = delete_appointment(State(state.clone()), Extension(nurse), Path("1".to_string()))
        .await
        .unwrap()
        .0;

    assert_eq!(response["success"], true);
    assert!(state.store.appointments().await.is_empty());
}

#[tokio::test]
async fn the_refresh_button_repulls_every_sheet() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("type=appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockSheetResponses::appointments(
            vec![MockSheetResponses::appointment_row("1", "Dr. Priya", "2024-12-25", "10:30")],
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("type=patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockSheetResponses::patients(
            vec![MockSheetResponses::patient_row("p1", "Asha Rao", "9800000001")],
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("type=doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockSheetResponses::doctors(
            vec![MockSheetResponses::staff_row("drpriya", "doctor", "Dr. Priya")],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let state = state_for(&server);
    let nurse = TestUser::nurse("nurse1").to_session_user();
    let response = refresh_data(State(state.clone()), Extension(nurse))
        .await
        .unwrap()
        .0;

    assert_eq!(response["success"], true);
    assert_eq!(state.store.appointments().await.len(), 1);
    assert_eq!(state.store.patients().await.len(), 1);
    assert_eq!(state.store.staff().await.len(), 1);
}

// ---- read views ----

#[tokio::test]
async fn doctors_see_only_their_own_board() {
    let state = offline_state();
    state
        .store
        .replace_appointments(vec![
            seeded_appointment("1", "Dr. Priya", "2024-12-25", "10:30"),
            seeded_appointment("2", "Dr. Anand", "2024-12-25", "11:00"),
        ])
        .await;

    let doctor = TestUser::doctor("drpriya", "Dr. Priya").to_session_user();
    let response = list_appointments(
        State(state.clone()),
        Extension(doctor),
        Query(AppointmentListQuery::default()),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(response["total"], 1);
    assert_eq!(response["appointments"][0]["doctor"], "Dr. Priya");

    let nurse = TestUser::nurse("nurse1").to_session_user();
    let response = list_appointments(
        State(state),
        Extension(nurse),
        Query(AppointmentListQuery::default()),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(response["total"], 2);
}

#[tokio::test]
async fn called_off_rows_hide_unless_asked_for() {
    let state = offline_state();
    let mut cancelled = seeded_appointment("2", "Dr. Priya", "2024-12-25", "11:00");
    cancelled.status = AppointmentStatus::NotComing;
    state
        .store
        .replace_appointments(vec![
            seeded_appointment("1", "Dr. Priya", "2024-12-25", "10:30"),
            cancelled,
        ])
        .await;

    let nurse = TestUser::nurse("nurse1").to_session_user();
    let response = list_appointments(
        State(state.clone()),
        Extension(nurse.clone()),
        Query(AppointmentListQuery::default()),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(response["total"], 1);

    let response = list_appointments(
        State(state),
        Extension(nurse),
        Query(AppointmentListQuery {
            include_not_coming: true,
            ..AppointmentListQuery::default()
        }),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(response["total"], 2);
}

#[tokio::test]
async fn the_list_filters_on_an_exact_day() {
    let state = offline_state();
    state
        .store
        .replace_appointments(vec![
            seeded_appointment("1", "Dr. Priya", "2024-12-25", "10:30"),
            seeded_appointment("2", "Dr. Priya", "2024-12-26", "10:30"),
        ])
        .await;

    let nurse = TestUser::nurse("nurse1").to_session_user();
    let response = list_appointments(
        State(state),
        Extension(nurse),
        Query(AppointmentListQuery {
            date: Some("2024-12-26".to_string()),
            ..AppointmentListQuery::default()
        }),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(response["total"], 1);
    assert_eq!(response["appointments"][0]["id"], "2");
}

#[tokio::test]
async fn upcoming_is_sorted_and_limited() {
    let state = offline_state();
    let mut cancelled = seeded_appointment("4", "Dr. Priya", "2999-01-02", "09:00");
    cancelled.status = AppointmentStatus::NotComing;
    state
        .store
        .replace_appointments(vec![
            seeded_appointment("1", "Dr. Priya", "2020-01-01", "10:30"),
            seeded_appointment("2", "Dr. Priya", "2999-12-31", "09:00"),
            seeded_appointment("3", "Dr. Priya", "2999-01-01", "10:00"),
            cancelled,
            seeded_appointment("5", "Dr. Priya", "2999-01-01", "09:30"),
        ])
        .await;

    let nurse = TestUser::nurse("nurse1").to_session_user();
    let response = upcoming_appointments(
        State(state.clone()),
        Extension(nurse.clone()),
        Query(UpcomingQuery::default()),
    )
    .await
    .unwrap()
    .0;

    // The past row and the called-off row are gone; the rest sort by
    // date then time.
    assert_eq!(response["total"], 3);
    assert_eq!(response["appointments"][0]["id"], "5");
    assert_eq!(response["appointments"][1]["id"], "3");
    assert_eq!(response["appointments"][2]["id"], "2");

    let response = upcoming_appointments(
        State(state),
        Extension(nurse),
        Query(UpcomingQuery { limit: Some(1) }),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(response["total"], 1);
    assert_eq!(response["appointments"][0]["id"], "5");
}

#[tokio::test]
async fn the_calendar_buckets_appointments_by_day() {
    let state = offline_state();
    state
        .store
        .replace_appointments(vec![
            seeded_appointment("1", "Dr. Priya", "2024-02-01", "10:30"),
            seeded_appointment("2", "Dr. Priya", "2024-02-01", "09:00"),
            seeded_appointment("3", "Dr. Priya", "2024-02-29", "14:00"),
        ])
        .await;

    let nurse = TestUser::nurse("nurse1").to_session_user();
    let response = calendar_view(
        State(state),
        Extension(nurse),
        Query(CalendarQuery { year: 2024, month: 1 }),
    )
    .await
    .unwrap()
    .0;

    assert_eq!(response["success"], true);
    let weeks = response["calendar"]["weeks"].as_array().unwrap();
    assert_eq!(weeks.len(), 5);

    // 2024-02-01 was a Thursday.
    let first = &weeks[0][4];
    assert_eq!(first["day"], 1);
    assert_eq!(first["date"], "2024-02-01");
    assert_eq!(first["appointments"].as_array().unwrap().len(), 2);
    assert_eq!(first["appointments"][0]["time"], "09:00");

    let leap_day = &weeks[4][4];
    assert_eq!(leap_day["day"], 29);
    assert_eq!(leap_day["appointments"][0]["id"], "3");

    // Lead cells before the 1st stay empty.
    assert!(weeks[0][0].is_null());
}

#[tokio::test]
async fn out_of_range_months_are_rejected() {
    let state = offline_state();
    let nurse = TestUser::nurse("nurse1").to_session_user();
    let err = calendar_view(
        State(state),
        Extension(nurse),
        Query(CalendarQuery { year: 2024, month: 12 }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn slots_follow_the_configured_hours() {
    let state = offline_state();
    let response = time_slots(State(state)).await.unwrap().0;
    let slots = response["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 37);
    assert_eq!(slots[0], "09:00");
    assert_eq!(slots[36], "18:00");

    let config = TestConfig {
        clinic_open_hour: 10,
        clinic_close_hour: 12,
        ..TestConfig::default()
    };
    let state = Arc::new(AppState::new(config.to_app_config()));
    let response = time_slots(State(state)).await.unwrap().0;
    assert_eq!(response["slots"].as_array().unwrap().len(), 9);
}
