use crate::domain::leave::{LeaveApplication, LeaveDecision};
use crate::domain::models::{GeoLocation, Notice};
use crate::error::AppResult;
use crate::services::hr::{self as hr_service, Punch};
use crate::state::SharedState;
use crate::web::session::BackendToken;
use crate::web::views::{self, AttendanceRow, LeaveRow, Listing};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Coordinates reported by the device. Both must be present to be used.
#[derive(Debug, Default, Deserialize)]
pub struct PunchPayload {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl PunchPayload {
    fn reported(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

#[derive(Serialize)]
pub struct PunchResponse {
    pub attendance: AttendanceRow,
    pub location: GeoLocation,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectPayload {
    #[serde(default, alias = "rejection_message")]
    pub message: String,
}

#[derive(Serialize)]
pub struct LeaveSubmitted {
    pub leave: Option<LeaveRow>,
    pub notices: Vec<Notice>,
}

pub fn attendance_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(attendance))
        .route("/check-in", post(check_in))
        .route("/check-out", post(check_out))
        .with_state(state)
}

pub fn leave_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list_leave).post(apply_leave))
        .route("/:id/approve", post(approve))
        .route("/:id/reject", post(reject))
        .with_state(state)
}

async fn check_in(
    State(state): State<SharedState>,
    token: BackendToken,
    payload: Option<Json<PunchPayload>>,
) -> AppResult<Json<PunchResponse>> {
    record_punch(state, token, Punch::In, payload).await
}

async fn check_out(
    State(state): State<SharedState>,
    token: BackendToken,
    payload: Option<Json<PunchPayload>>,
) -> AppResult<Json<PunchResponse>> {
    record_punch(state, token, Punch::Out, payload).await
}

async fn record_punch(
    state: SharedState,
    token: BackendToken,
    punch: Punch,
    payload: Option<Json<PunchPayload>>,
) -> AppResult<Json<PunchResponse>> {
    let api = token.client(&state);
    let reported = payload.and_then(|Json(p)| p.reported());
    let outcome = hr_service::punch(&state, &api, punch, reported).await?;
    Ok(Json(PunchResponse {
        attendance: views::attendance_row(&outcome.record, &state.config.timezone),
        location: outcome.location,
        notices: outcome.notices,
    }))
}

async fn attendance(
    State(state): State<SharedState>,
    token: BackendToken,
    Query(range): Query<RangeQuery>,
) -> AppResult<Json<Listing<AttendanceRow>>> {
    let api = token.client(&state);
    let records = hr_service::attendance(&state, &api, range.start_date, range.end_date).await?;
    let rows = records
        .iter()
        .map(|r| views::attendance_row(r, &state.config.timezone))
        .collect();
    Ok(Json(Listing::new(rows, Vec::new())))
}

async fn list_leave(State(state): State<SharedState>, token: BackendToken) -> AppResult<Json<Listing<LeaveRow>>> {
    let api = token.client(&state);
    let requests = hr_service::leave_requests(&api).await?;
    Ok(Json(Listing::new(requests.iter().map(views::leave_row).collect(), Vec::new())))
}

async fn apply_leave(
    State(state): State<SharedState>,
    token: BackendToken,
    Json(application): Json<LeaveApplication>,
) -> AppResult<(StatusCode, Json<LeaveSubmitted>)> {
    let api = token.client(&state);
    let (created, notice) = hr_service::apply_leave(&api, &application).await?;
    Ok((
        StatusCode::CREATED,
        Json(LeaveSubmitted {
            leave: created.as_ref().map(views::leave_row),
            notices: vec![notice],
        }),
    ))
}

async fn approve(
    State(state): State<SharedState>,
    token: BackendToken,
    Path(id): Path<String>,
) -> AppResult<Json<LeaveRow>> {
    let api = token.client(&state);
    let updated = hr_service::decide_leave(&api, &id, LeaveDecision::Approve).await?;
    Ok(Json(views::leave_row(&updated)))
}

async fn reject(
    State(state): State<SharedState>,
    token: BackendToken,
    Path(id): Path<String>,
    Json(payload): Json<RejectPayload>,
) -> AppResult<Json<LeaveRow>> {
    let api = token.client(&state);
    let decision = LeaveDecision::Reject { message: payload.message };
    let updated = hr_service::decide_leave(&api, &id, decision).await?;
    Ok(Json(views::leave_row(&updated)))
}
