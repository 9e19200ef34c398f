use crate::api::client::ApiClient;
use crate::api::hr::{self as hr_api, PunchPayload};
use crate::api::{roles as roles_api, tasks as tasks_api};
use crate::domain::leave::{check_decision, LeaveApplication, LeaveDecision};
use crate::domain::models::{
    AttendanceRecord, AttendanceStatus, GeoLocation, LeaveRequest, LeaveStatus, Notice, Role, Task, TaskStatus,
};
use crate::domain::task::{check_transition, NewTask};
use crate::error::{AppError, AppResult};
use crate::services::geo::resolve_location;
use crate::state::AppState;
use crate::time_utils;
use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Punch {
    In,
    Out,
}

#[derive(Debug, Serialize)]
pub struct PunchOutcome {
    pub record: AttendanceRecord,
    pub location: GeoLocation,
    pub notices: Vec<Notice>,
}

/// Check-in or check-out at the current position. The position is taken
/// once; a timeout surfaces as `AppError::Geolocation`.
pub async fn punch(
    state: &AppState,
    api: &ApiClient,
    punch: Punch,
    reported: Option<(f64, f64)>,
) -> AppResult<PunchOutcome> {
    let location = resolve_location(
        state.geolocator.as_ref(),
        &state.geocoder,
        state.config.geolocation_timeout,
        reported,
    )
    .await?;

    let now = Utc::now();
    let date = time_utils::local_date(&state.config.timezone, now);
    let payload = PunchPayload::new(&location, now, date);

    let returned = match punch {
        Punch::In => hr_api::check_in(api, &payload).await?,
        Punch::Out => hr_api::check_out(api, &payload).await?,
    };

    let record = returned
        .unwrap_or_else(|| local_record(punch, &payload, &location))
        .with_derived_hours();

    let message = match punch {
        Punch::In => format!(
            "Checked in at {}",
            time_utils::format_local_time(&state.config.timezone, now)
        ),
        Punch::Out => match record.working_hours {
            Some(hours) => format!("Checked out. {:.2} hours worked today.", hours),
            None => "Checked out.".to_string(),
        },
    };
    tracing::info!("Attendance {:?} recorded for {}", punch, date);

    Ok(PunchOutcome {
        record,
        location,
        notices: vec![Notice::info(message)],
    })
}

/// Record shown when the backend accepted the punch without echoing it.
fn local_record(punch: Punch, payload: &PunchPayload, location: &GeoLocation) -> AttendanceRecord {
    let (check_in, check_in_location, check_out, check_out_location) = match punch {
        Punch::In => (Some(payload.timestamp), Some(location.clone()), None, None),
        Punch::Out => (None, None, Some(payload.timestamp), Some(location.clone())),
    };
    AttendanceRecord {
        id: None,
        user_id: String::new(),
        date: payload.date,
        status: AttendanceStatus::Present,
        check_in,
        check_out,
        check_in_location,
        check_out_location,
        working_hours: None,
    }
}

/// Attendance between `start` and `end`, defaulting to the current month up
/// to today in the configured timezone.
pub async fn attendance(
    state: &AppState,
    api: &ApiClient,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> AppResult<Vec<AttendanceRecord>> {
    let today = time_utils::local_date(&state.config.timezone, Utc::now());
    let end = end.unwrap_or(today);
    let start = match start {
        Some(start) => start,
        None => end.with_day(1).unwrap_or(end),
    };
    if end < start {
        return Err(AppError::validation("end date cannot be before start date"));
    }

    let mut records: Vec<AttendanceRecord> = hr_api::attendance_history(api, start, end)
        .await?
        .into_iter()
        .map(AttendanceRecord::with_derived_hours)
        .collect();
    records.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(records)
}

pub async fn leave_requests(api: &ApiClient) -> AppResult<Vec<LeaveRequest>> {
    hr_api::leave_requests(api).await
}

/// Validates locally first; nothing is sent for an invalid application.
pub async fn apply_leave(api: &ApiClient, application: &LeaveApplication) -> AppResult<(Option<LeaveRequest>, Notice)> {
    let leave = application.validate()?;
    let created = hr_api::apply_leave(api, &leave).await?;
    tracing::info!(
        "Leave request submitted: {} from {} to {}",
        leave.leave_type,
        leave.start_date,
        leave.end_date
    );
    Ok((created, Notice::info("Leave request submitted.")))
}

pub async fn decide_leave(api: &ApiClient, id: &str, decision: LeaveDecision) -> AppResult<LeaveRequest> {
    let current = hr_api::leave_requests(api)
        .await?
        .into_iter()
        .find(|r| r.id == id)
        .ok_or_else(|| AppError::validation(format!("leave request {} not found", id)))?;
    check_decision(&current, &decision)?;

    let updated = hr_api::decide_leave(api, id, &decision).await?;
    Ok(updated.unwrap_or_else(|| {
        let mut request = current;
        match decision {
            LeaveDecision::Approve => request.status = LeaveStatus::Approved,
            LeaveDecision::Reject { message } => {
                request.status = LeaveStatus::Rejected;
                request.rejection_message = Some(message.trim().to_string());
            }
        }
        request
    }))
}

pub async fn tasks(api: &ApiClient) -> AppResult<Vec<Task>> {
    tasks_api::list_tasks(api).await
}

pub async fn create_task(api: &ApiClient, task: NewTask) -> AppResult<Option<Task>> {
    let task = task.validate()?;
    tasks_api::create_task(api, &task).await
}

/// Moves a task along its workflow. The transition is checked against the
/// status the backend currently reports.
pub async fn update_task_status(api: &ApiClient, id: &str, next: TaskStatus) -> AppResult<Task> {
    let current = tasks_api::list_tasks(api)
        .await?
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| AppError::validation(format!("task {} not found", id)))?;
    check_transition(current.status, next)?;

    let updated = tasks_api::update_status(api, id, next).await?;
    Ok(updated.unwrap_or(Task { status: next, ..current }))
}

pub async fn roles(api: &ApiClient) -> AppResult<Vec<Role>> {
    roles_api::list_roles(api).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::geo::FixedGeolocator;
    use crate::storage::local_store::LocalStore;
    use mockito::Matcher;
    use serde_json::json;
    use std::sync::Arc;

    async fn state_for(url: &str, geocoder: &str) -> AppState {
        let config = Config::from_lookup(|key| match key {
            "API_BASE_URL" => Some(url.to_string()),
            "GEOCODER_URL" => Some(geocoder.to_string()),
            "REQUEST_TIMEOUT_SECS" => Some("2".to_string()),
            _ => None,
        })
        .unwrap();
        let store = Arc::new(LocalStore::in_memory());
        store.set("token", "secret".into()).await.unwrap();
        AppState::with_parts(config, store, Arc::new(FixedGeolocator::new(12.9716, 77.5946))).unwrap()
    }

    #[tokio::test]
    async fn test_check_in_sends_position_and_address() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/reverse")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"display_name":"Cubbon Park, Bengaluru"}"#)
            .create_async()
            .await;
        let mock = server
            .mock("POST", "/api/hr/attendance/check-in")
            .match_header("authorization", "Bearer secret")
            .match_body(Matcher::PartialJson(json!({
                "latitude": 12.9716,
                "longitude": 77.5946,
                "address": "Cubbon Park, Bengaluru"
            })))
            .with_status(201)
            .with_body(r#"{"message":"ok"}"#)
            .create_async()
            .await;

        let state = state_for(&server.url(), &server.url()).await;
        let outcome = punch(&state, &state.api, Punch::In, None).await.unwrap();
        assert!(outcome.record.is_checked_in());
        assert_eq!(outcome.location.address.as_deref(), Some("Cubbon Park, Bengaluru"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unconfigured_position_sends_nothing() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/hr/attendance/check-in")
            .expect(0)
            .create_async()
            .await;

        let config = Config::from_lookup(|key| match key {
            "API_BASE_URL" => Some(server.url()),
            _ => None,
        })
        .unwrap();
        let store = Arc::new(LocalStore::in_memory());
        let state = AppState::with_parts(config, store, Arc::new(FixedGeolocator::new(0.0, 0.0))).unwrap();

        let err = punch(&state, &state.api, Punch::In, None).await.unwrap_err();
        assert!(matches!(err, AppError::Geolocation(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_reject_requires_pending_request() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/hr/leave/requests")
            .with_status(200)
            .with_body(
                r#"{"leave_requests":[
                {"id":1,"user_id":5,"leave_type":"casual","start_date":"2024-07-01","end_date":"2024-07-02","reason":"trip","status":"approved"},
                {"id":2,"user_id":5,"leave_type":"sick","start_date":"2024-07-08","end_date":"2024-07-08","reason":"fever","status":"pending"}]}"#,
            )
            .create_async()
            .await;
        server
            .mock("PUT", "/api/hr/leave/requests/2/reject")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let state = state_for(&server.url(), "http://127.0.0.1:9").await;
        let err = decide_leave(&state.api, "1", LeaveDecision::Approve).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let rejected = decide_leave(&state.api, "2", LeaveDecision::Reject { message: "busy week".into() })
            .await
            .unwrap();
        assert_eq!(rejected.status, LeaveStatus::Rejected);
        assert_eq!(rejected.rejection_message.as_deref(), Some("busy week"));
    }

    #[tokio::test]
    async fn test_invalid_leave_is_not_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/hr/leave/requests")
            .expect(0)
            .create_async()
            .await;

        let state = state_for(&server.url(), "http://127.0.0.1:9").await;
        let application = LeaveApplication {
            leave_type: "sick".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 7, 5),
            end_date: NaiveDate::from_ymd_opt(2024, 7, 4),
            reason: "fever".into(),
        };
        assert!(apply_leave(&state.api, &application).await.is_err());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_task_transition_checked_against_backend() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/tasks/")
            .with_status(200)
            .with_body(r#"[{"id":"t1","title":"Call back","status":"todo"}]"#)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/api/tasks/t1/status")
            .match_body(Matcher::Json(json!({ "status": "in_progress" })))
            .with_status(200)
            .with_body(r#"{"success":true}"#)
            .create_async()
            .await;

        let state = state_for(&server.url(), "http://127.0.0.1:9").await;
        let err = update_task_status(&state.api, "t1", TaskStatus::Done).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let task = update_task_status(&state.api, "t1", TaskStatus::InProgress).await.unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        put.assert_async().await;
    }
}
