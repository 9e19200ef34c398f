mod api;
mod config;
mod domain;
mod error;
mod services;
mod state;
mod storage;
mod time_utils;
mod web;

use crate::config::Config;
use crate::error::AppError;
use crate::state::{AppState, SharedState};
use axum::Router;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
        e
    })?;
    tracing::info!("Using backend at {}", config.api_base_url);
    tracing::info!("Local storage at {}", config.storage_path);

    let shared: SharedState = Arc::new(AppState::build(config).await?);

    let pending = shared.outbox.pending().await.len();
    if pending > 0 {
        tracing::info!("{} assignment(s) waiting in the outbox", pending);
    }

    let mut scheduler = JobScheduler::new().await?;

    // Replay assignment writes the backend could not take earlier
    let shared_for_outbox = shared.clone();
    scheduler
        .add(Job::new_async(shared.config.outbox_flush_cron.as_str(), move |_uuid, _l| {
            let state = shared_for_outbox.clone();
            Box::pin(async move {
                if state.outbox.pending().await.is_empty() {
                    return;
                }
                match services::leads::flush_outbox(&state, &state.api).await {
                    Ok(_) => {}
                    Err(AppError::MissingToken) => {
                        tracing::debug!("Outbox flush skipped: no stored access token");
                    }
                    Err(e) => tracing::error!("Outbox flush failed: {}", e),
                }
            })
        })?)
        .await?;

    scheduler.start().await?;
    tracing::info!("Scheduler started:");
    tracing::info!("  - Outbox flush: {}", shared.config.outbox_flush_cron);

    let app = Router::new()
        .merge(web::routes(shared.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        );

    let addr = shared.config.bind_addr.clone();
    tracing::info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let shutdown = shared.shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutting down, cancelling in-flight backend calls");
            shutdown.cancel();
        })
        .await?;

    scheduler.shutdown().await?;
    Ok(())
}
