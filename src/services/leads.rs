use crate::api::client::ApiClient;
use crate::api::leads as leads_api;
use crate::domain::filter::{LeadFilter, Page};
use crate::domain::lead::Lead;
use crate::domain::models::{Assignment, AssignmentRequest, LeadSource, Notice, SalesUser};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::storage::outbox::FlushReport;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;

/// Shown when neither sources nor integrations can be fetched.
static KNOWN_SOURCES: Lazy<Vec<LeadSource>> = Lazy::new(|| {
    [
        ("google_sheets", "Google Sheets"),
        ("meta_ads", "Meta Ads"),
        ("api", "API"),
        ("website", "Website"),
        ("manual", "Manual Entry"),
    ]
    .into_iter()
    .map(|(source_type, name)| LeadSource {
        id: source_type.to_string(),
        name: name.to_string(),
        source_type: source_type.to_string(),
        total_leads: 0,
        last_sync_time: None,
    })
    .collect()
});

#[derive(Debug, Serialize)]
pub struct AssignOutcome {
    pub assignment: Assignment,
    pub synced: bool,
    pub notices: Vec<Notice>,
}

/// One page of a caller's board, ready for rendering.
#[derive(Debug)]
pub struct LeadView {
    pub page: Page<Lead>,
    pub filter: LeadFilter,
    pub loaded_at: Option<DateTime<Utc>>,
    pub notices: Vec<Notice>,
}

/// Boards are keyed by the token the caller authenticates with.
async fn session_of(api: &ApiClient) -> AppResult<String> {
    api.token().await.ok_or(AppError::MissingToken)
}

/// Refetches leads, assignees and assignments and rebuilds the caller's
/// board. Outages become notices and the board keeps its previous contents
/// if the leads themselves cannot be fetched. A refusal (401/403 and other
/// 4xx) is returned as an error and the board is left untouched.
pub async fn refresh_board(state: &AppState, api: &ApiClient) -> AppResult<Vec<Notice>> {
    let session = session_of(api).await?;
    let mut notices = Vec::new();

    let leads = match leads_api::fetch_leads(api, state.config.lead_fetch_limit).await {
        Ok(leads) => leads,
        Err(e) if e.is_backend_failure() => {
            tracing::error!("Failed to fetch leads: {}", e);
            notices.push(Notice::error("Could not load leads. Showing the last loaded list."));
            return Ok(notices);
        }
        Err(e) => return Err(e),
    };

    let users = match leads_api::fetch_sales_users(api).await {
        Ok(users) => users,
        Err(e) if e.is_backend_failure() => {
            tracing::warn!("Failed to fetch sales users: {}", e);
            notices.push(Notice::warning("Could not load team members."));
            state.boards.users(&session).await
        }
        Err(e) => return Err(e),
    };

    let assignments = match leads_api::fetch_assignments(api).await {
        Ok(assignments) => {
            if let Err(e) = state.cache.save(&assignments).await {
                tracing::warn!("Failed to cache assignments: {}", e);
            }
            assignments
        }
        Err(e) if e.is_backend_failure() => {
            tracing::warn!("Failed to fetch assignments, using cached copy: {}", e);
            notices.push(Notice::warning("Assignments could not be refreshed. Showing saved assignments."));
            state.cache.load().await
        }
        Err(e) => return Err(e),
    };

    let pending = state.outbox.pending_assignments().await;

    state
        .boards
        .with_board(&session, |board| {
            board.replace_leads(leads, users);
            let assigned = board.apply_assignments(&assignments);
            let overlaid = board.apply_pending(&pending);
            tracing::info!(
                "Lead board refreshed: {} leads, {} assigned, {} pending sync",
                board.leads().len(),
                assigned,
                overlaid
            );
        })
        .await;

    if !pending.is_empty() {
        notices.push(Notice::info(format!(
            "{} assignment(s) are waiting to be synced.",
            pending.len()
        )));
    }
    Ok(notices)
}

/// Refreshes the caller's board and returns its current page.
pub async fn refresh_view(state: &AppState, api: &ApiClient) -> AppResult<LeadView> {
    let notices = refresh_board(state, api).await?;
    let session = session_of(api).await?;
    Ok(state
        .boards
        .with_board(&session, |board| LeadView {
            page: board.visible(),
            filter: board.filter().clone(),
            loaded_at: board.loaded_at(),
            notices,
        })
        .await)
}

/// Filtered page of the caller's board, loading it first if this caller
/// has no board yet. An explicit `page` is always honoured; without one a
/// new filter or page size starts over at page 1.
pub async fn lead_page(
    state: &AppState,
    api: &ApiClient,
    filter: LeadFilter,
    page: Option<usize>,
    page_size: Option<usize>,
) -> AppResult<LeadView> {
    let session = session_of(api).await?;
    let notices = if state.boards.is_loaded(&session).await {
        Vec::new()
    } else {
        refresh_board(state, api).await?
    };

    Ok(state
        .boards
        .with_board(&session, |board| LeadView {
            page: board.show(filter, page, page_size),
            filter: board.filter().clone(),
            loaded_at: board.loaded_at(),
            notices,
        })
        .await)
}

/// Sends one assignment. If the backend is unreachable the write goes to
/// the outbox and the lead shows it as pending. A refusal is returned as is.
pub async fn assign_lead(state: &AppState, api: &ApiClient, request: AssignmentRequest) -> AppResult<AssignOutcome> {
    let mut request = request.validate()?;
    let session = session_of(api).await?;
    if request.assigned_to_name.is_none() {
        request.assigned_to_name = state
            .boards
            .users(&session)
            .await
            .into_iter()
            .find(|u| u.id == request.assigned_to)
            .map(|u| u.name);
    }

    match leads_api::create_assignment(api, &request).await {
        Ok(assignment) => {
            if let Err(e) = state.cache.upsert(assignment.clone()).await {
                tracing::warn!("Failed to cache assignment for lead {}: {}", assignment.lead_id, e);
            }
            if let Err(e) = state.outbox.discard(&assignment.lead_id).await {
                tracing::warn!("Failed to drop queued assignment for lead {}: {}", assignment.lead_id, e);
            }
            state.boards.assign_everywhere(&assignment, false).await;
            tracing::info!("Lead {} assigned to {}", assignment.lead_id, assignment.assigned_to);
            Ok(AssignOutcome {
                assignment,
                synced: true,
                notices: vec![Notice::info("Lead assigned successfully.")],
            })
        }
        Err(e) if e.is_backend_failure() => {
            let entry = state.outbox.enqueue(request, &e).await?;
            let assignment = entry.request.to_assignment(entry.queued_at);
            state.boards.assign_everywhere(&assignment, true).await;
            Ok(AssignOutcome {
                assignment,
                synced: false,
                notices: vec![Notice::warning(
                    "Server unavailable. The assignment was saved and will sync automatically.",
                )],
            })
        }
        Err(e) => Err(e),
    }
}

/// Replays queued assignments. Accepted ones are marked synced on every
/// board; refused ones are taken off the boards again.
pub async fn flush_outbox(state: &AppState, api: &ApiClient) -> AppResult<FlushReport> {
    let report = state
        .outbox
        .flush(|request| {
            let api = api.clone();
            async move { leads_api::create_assignment(&api, &request).await }
        })
        .await?;

    for assignment in &report.confirmed {
        if let Err(e) = state.cache.upsert(assignment.clone()).await {
            tracing::warn!("Failed to cache assignment for lead {}: {}", assignment.lead_id, e);
        }
        state.boards.assign_everywhere(assignment, false).await;
    }

    if !report.rejected.is_empty() {
        let cached = state.cache.load().await;
        for entry in &report.rejected {
            let lead_id = &entry.request.lead_id;
            let previous = cached.iter().find(|a| &a.lead_id == lead_id);
            state.boards.revert_pending_everywhere(lead_id, previous).await;
        }
    }
    Ok(report)
}

pub async fn lead_sources(api: &ApiClient) -> AppResult<(Vec<LeadSource>, Vec<Notice>)> {
    match leads_api::fetch_sources(api).await {
        Ok(sources) if !sources.is_empty() => return Ok((sources, Vec::new())),
        Ok(_) => {}
        Err(e) if e.is_backend_failure() || e.is_rejection() => {
            tracing::warn!("Failed to fetch lead sources: {}", e)
        }
        Err(e) => return Err(e),
    }

    match leads_api::fetch_integrations(api).await {
        Ok(integrations) if !integrations.is_empty() => Ok((integrations, Vec::new())),
        Ok(_) => Ok((
            KNOWN_SOURCES.clone(),
            vec![Notice::info("No lead sources are configured yet.")],
        )),
        Err(e) if e.is_backend_failure() || e.is_rejection() => {
            tracing::warn!("Failed to fetch integrations: {}", e);
            Ok((
                KNOWN_SOURCES.clone(),
                vec![Notice::warning("Lead sources could not be loaded. Showing defaults.")],
            ))
        }
        Err(e) => Err(e),
    }
}

/// Assignable team members; falls back to the ones on the caller's board.
pub async fn sales_users(state: &AppState, api: &ApiClient) -> AppResult<(Vec<SalesUser>, Vec<Notice>)> {
    match leads_api::fetch_sales_users(api).await {
        Ok(users) => Ok((users, Vec::new())),
        Err(e) if e.is_backend_failure() => {
            tracing::warn!("Failed to fetch sales users: {}", e);
            Ok((
                state.boards.users(&session_of(api).await?).await,
                vec![Notice::warning("Could not load team members.")],
            ))
        }
        Err(e) => Err(e),
    }
}

pub async fn my_assigned_leads(api: &ApiClient) -> AppResult<Vec<Lead>> {
    leads_api::fetch_assigned_leads(api).await
}
