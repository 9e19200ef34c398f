pub mod hr;
pub mod leads;
pub mod session;
pub mod tasks;
pub mod views;

use crate::state::SharedState;
use axum::{routing::get, Router};

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/leads", leads::router(state.clone()))
        .nest("/outbox", leads::outbox_router(state.clone()))
        .nest("/attendance", hr::attendance_router(state.clone()))
        .nest("/leave", hr::leave_router(state.clone()))
        .nest("/tasks", tasks::router(state.clone()))
        .merge(leads::directory_router(state.clone()))
        .merge(tasks::roles_router(state))
}
