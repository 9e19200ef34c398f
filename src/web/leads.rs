use crate::domain::filter::{LeadFilter, LeadFilterParams};
use crate::domain::models::{AssignmentRequest, LeadSource, SalesRole, SalesUser};
use crate::error::AppResult;
use crate::services::leads as lead_service;
use crate::services::leads::{AssignOutcome, LeadView};
use crate::state::SharedState;
use crate::storage::outbox::{FlushReport, PendingAssignment};
use crate::web::session::BackendToken;
use crate::web::views::{self, LeadRow, LeadTable, Listing};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct LeadsQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub source: Option<String>,
    pub campaign: Option<String>,
    pub assigned_to: Option<String>,
    pub search: Option<String>,
}

impl LeadsQuery {
    fn filter(&self) -> LeadFilter {
        LeadFilter::from(LeadFilterParams {
            source: self.source.clone(),
            campaign: self.campaign.clone(),
            assigned_to: self.assigned_to.clone(),
            search: self.search.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignPayload {
    pub assigned_to: String,
    pub assigned_role: SalesRole,
    #[serde(default)]
    pub assigned_to_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list_leads))
        .route("/refresh", post(refresh))
        .route("/assigned", get(assigned_leads))
        .route("/sources", get(sources))
        .route("/:id/assign", post(assign))
        .with_state(state)
}

pub fn outbox_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(pending))
        .route("/flush", post(flush))
        .with_state(state)
}

pub fn directory_router(state: SharedState) -> Router {
    Router::new()
        .route("/sales-users", get(sales_users))
        .with_state(state)
}

async fn list_leads(
    State(state): State<SharedState>,
    token: BackendToken,
    Query(query): Query<LeadsQuery>,
) -> AppResult<Json<LeadTable>> {
    let api = token.client(&state);
    let view = lead_service::lead_page(&state, &api, query.filter(), query.page, query.page_size).await?;
    Ok(Json(table(view)))
}

async fn refresh(State(state): State<SharedState>, token: BackendToken) -> AppResult<Json<LeadTable>> {
    let api = token.client(&state);
    let view = lead_service::refresh_view(&state, &api).await?;
    Ok(Json(table(view)))
}

fn table(view: LeadView) -> LeadTable {
    views::lead_table(view.page, view.filter, view.loaded_at, view.notices)
}

async fn assign(
    State(state): State<SharedState>,
    token: BackendToken,
    Path(lead_id): Path<String>,
    Json(payload): Json<AssignPayload>,
) -> AppResult<(StatusCode, Json<AssignOutcome>)> {
    let api = token.client(&state);
    let request = AssignmentRequest {
        lead_id,
        assigned_to: payload.assigned_to,
        assigned_role: payload.assigned_role,
        assigned_to_name: payload.assigned_to_name,
        notes: payload.notes,
    };
    let outcome = lead_service::assign_lead(&state, &api, request).await?;
    let status = if outcome.synced { StatusCode::OK } else { StatusCode::ACCEPTED };
    Ok((status, Json(outcome)))
}

async fn assigned_leads(State(state): State<SharedState>, token: BackendToken) -> AppResult<Json<Listing<LeadRow>>> {
    let api = token.client(&state);
    let leads = lead_service::my_assigned_leads(&api).await?;
    Ok(Json(Listing::new(leads.iter().map(views::lead_row).collect(), Vec::new())))
}

async fn sources(State(state): State<SharedState>, token: BackendToken) -> AppResult<Json<Listing<LeadSource>>> {
    let api = token.client(&state);
    let (sources, notices) = lead_service::lead_sources(&api).await?;
    Ok(Json(Listing::new(sources, notices)))
}

async fn sales_users(State(state): State<SharedState>, token: BackendToken) -> AppResult<Json<Listing<SalesUser>>> {
    let api = token.client(&state);
    let (users, notices) = lead_service::sales_users(&state, &api).await?;
    Ok(Json(Listing::new(users, notices)))
}

async fn pending(State(state): State<SharedState>, _token: BackendToken) -> Json<Vec<PendingAssignment>> {
    Json(state.outbox.pending().await)
}

async fn flush(State(state): State<SharedState>, token: BackendToken) -> AppResult<Json<FlushReport>> {
    let api = token.client(&state);
    Ok(Json(lead_service::flush_outbox(&state, &api).await?))
}
