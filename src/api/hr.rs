use crate::api::client::ApiClient;
use crate::api::envelope;
use crate::domain::leave::{LeaveDecision, ValidLeave};
use crate::domain::models::{AttendanceRecord, GeoLocation, LeaveRequest};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, Serialize)]
pub struct PunchPayload {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub timestamp: DateTime<Utc>,
    pub date: NaiveDate,
}

impl PunchPayload {
    pub fn new(location: &GeoLocation, timestamp: DateTime<Utc>, date: NaiveDate) -> Self {
        Self {
            latitude: location.lat,
            longitude: location.long,
            address: location.address.clone().unwrap_or_default(),
            timestamp,
            date,
        }
    }
}

const ATTENDANCE_KEYS: &[&str] = &["attendance", "record"];
const LEAVE_KEYS: &[&str] = &["leave_requests", "leaves", "requests", "leave_request", "leave"];

pub async fn check_in(api: &ApiClient, payload: &PunchPayload) -> AppResult<Option<AttendanceRecord>> {
    let body = api.post("/api/hr/attendance/check-in", payload).await?;
    Ok(envelope::parse_record(body, ATTENDANCE_KEYS))
}

pub async fn check_out(api: &ApiClient, payload: &PunchPayload) -> AppResult<Option<AttendanceRecord>> {
    let body = api.post("/api/hr/attendance/check-out", payload).await?;
    Ok(envelope::parse_record(body, ATTENDANCE_KEYS))
}

pub async fn attendance_history(
    api: &ApiClient,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> AppResult<Vec<AttendanceRecord>> {
    let body = api
        .get(
            "/api/hr/attendance/my-attendance",
            &[
                ("start_date", start_date.to_string()),
                ("end_date", end_date.to_string()),
            ],
        )
        .await?;
    Ok(envelope::parse_list(body, &["attendance", "records"]))
}

pub async fn leave_requests(api: &ApiClient) -> AppResult<Vec<LeaveRequest>> {
    let body = api.get("/api/hr/leave/requests", &[]).await?;
    Ok(envelope::parse_list(body, LEAVE_KEYS))
}

pub async fn apply_leave(api: &ApiClient, leave: &ValidLeave) -> AppResult<Option<LeaveRequest>> {
    let body = api.post("/api/hr/leave/requests", leave).await?;
    Ok(envelope::parse_record(body, LEAVE_KEYS))
}

pub async fn decide_leave(api: &ApiClient, id: &str, decision: &LeaveDecision) -> AppResult<Option<LeaveRequest>> {
    if id.trim().is_empty() {
        return Err(AppError::validation("leave request id is required"));
    }
    let body = match decision {
        LeaveDecision::Approve => {
            api.put(&format!("/api/hr/leave/requests/{}/approve", id), &json!({}))
                .await?
        }
        LeaveDecision::Reject { message } => {
            api.put(
                &format!("/api/hr/leave/requests/{}/reject", id),
                &json!({ "rejection_message": message.trim() }),
            )
            .await?
        }
    };
    Ok(envelope::parse_record(body, LEAVE_KEYS))
}
