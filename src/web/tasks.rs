use crate::domain::models::{Role, TaskStatus};
use crate::domain::task::NewTask;
use crate::error::AppResult;
use crate::services::hr as hr_service;
use crate::state::SharedState;
use crate::web::session::BackendToken;
use crate::web::views::{self, Listing, TaskRow};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct RolesQuery {
    pub permission: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusPayload {
    pub status: TaskStatus,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/:id/status", post(update_status))
        .with_state(state)
}

pub fn roles_router(state: SharedState) -> Router {
    Router::new().route("/roles", get(list_roles)).with_state(state)
}

async fn list_tasks(State(state): State<SharedState>, token: BackendToken) -> AppResult<Json<Listing<TaskRow>>> {
    let api = token.client(&state);
    let tasks = hr_service::tasks(&api).await?;
    Ok(Json(Listing::new(tasks.iter().map(views::task_row).collect(), Vec::new())))
}

async fn create_task(
    State(state): State<SharedState>,
    token: BackendToken,
    Json(task): Json<NewTask>,
) -> AppResult<(StatusCode, Json<Option<TaskRow>>)> {
    let api = token.client(&state);
    let created = hr_service::create_task(&api, task).await?;
    Ok((StatusCode::CREATED, Json(created.as_ref().map(views::task_row))))
}

async fn update_status(
    State(state): State<SharedState>,
    token: BackendToken,
    Path(id): Path<String>,
    Json(payload): Json<StatusPayload>,
) -> AppResult<Json<TaskRow>> {
    let api = token.client(&state);
    let task = hr_service::update_task_status(&api, &id, payload.status).await?;
    Ok(Json(views::task_row(&task)))
}

/// `?permission=` keeps only the roles granting that permission.
async fn list_roles(
    State(state): State<SharedState>,
    token: BackendToken,
    Query(query): Query<RolesQuery>,
) -> AppResult<Json<Vec<Role>>> {
    let api = token.client(&state);
    let mut roles = hr_service::roles(&api).await?;
    if let Some(permission) = query.permission.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        roles.retain(|role| role.has_permission(permission));
    }
    Ok(Json(roles))
}
