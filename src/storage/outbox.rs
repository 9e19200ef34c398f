//! Assignment writes the backend has not accepted yet.
//!
//! Entries are coalesced per lead and replayed in queue order. Network calls
//! happen outside the internal lock so new writes can be queued mid-flush.

use crate::domain::models::{Assignment, AssignmentRequest};
use crate::error::{AppError, AppResult};
use crate::storage::local_store::LocalStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const OUTBOX_KEY: &str = "bharat_crm_assignment_outbox";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingAssignment {
    pub id: Uuid,
    pub request: AssignmentRequest,
    pub queued_at: DateTime<Utc>,
    pub attempts: u32,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct FlushReport {
    pub sent: usize,
    pub failed: usize,
    pub remaining: usize,
    /// Writes the backend refused outright. They are dropped from the queue.
    pub rejected: Vec<PendingAssignment>,
    /// Another flush was already running, so nothing was sent.
    pub skipped: bool,
    /// Accepted writes that are still the newest intent for their lead.
    #[serde(skip)]
    pub confirmed: Vec<Assignment>,
}

pub struct Outbox {
    store: Arc<LocalStore>,
    lock: Mutex<()>,
    flushing: Mutex<()>,
}

impl Outbox {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
            flushing: Mutex::new(()),
        }
    }

    pub async fn pending(&self) -> Vec<PendingAssignment> {
        match self.store.get_json::<Vec<PendingAssignment>>(OUTBOX_KEY).await {
            Ok(entries) => entries.unwrap_or_default(),
            Err(e) => {
                tracing::error!("Outbox is unreadable, treating it as empty: {}", e);
                Vec::new()
            }
        }
    }

    /// Pending writes as the assignments they would create.
    pub async fn pending_assignments(&self) -> Vec<Assignment> {
        self.pending()
            .await
            .iter()
            .map(|entry| entry.request.to_assignment(entry.queued_at))
            .collect()
    }

    /// Queues a write after a failed send. A queued write for the same lead
    /// is replaced, so only the newest intent per lead is replayed.
    pub async fn enqueue(&self, request: AssignmentRequest, error: &AppError) -> AppResult<PendingAssignment> {
        let _guard = self.lock.lock().await;
        let mut entries = self.pending().await;
        entries.retain(|e| e.request.lead_id != request.lead_id);

        let entry = PendingAssignment {
            id: Uuid::new_v4(),
            request,
            queued_at: Utc::now(),
            attempts: 1,
            last_error: Some(error.to_string()),
        };
        entries.push(entry.clone());
        self.store.set_json(OUTBOX_KEY, &entries).await?;

        tracing::info!(
            "Queued assignment of lead {} for later sync ({} pending)",
            entry.request.lead_id,
            entries.len()
        );
        Ok(entry)
    }

    /// Drops the queued write for `lead_id`, if any. Called once a newer
    /// assignment of that lead reached the backend directly.
    pub async fn discard(&self, lead_id: &str) -> AppResult<bool> {
        let _guard = self.lock.lock().await;
        let mut entries = self.pending().await;
        let before = entries.len();
        entries.retain(|e| e.request.lead_id != lead_id);
        if entries.len() == before {
            return Ok(false);
        }
        self.save(&entries).await?;
        tracing::info!("Dropped queued assignment of lead {}", lead_id);
        Ok(true)
    }

    /// Replays every queued write through `send`, one flush at a time.
    ///
    /// Accepted entries are removed. Entries the backend refuses (4xx) are
    /// dropped and reported; other failures keep their place with the
    /// attempt counted. Cancellation stops the flush early and a 401 aborts
    /// it with the error, leaving the queue as it was.
    pub async fn flush<F, Fut>(&self, send: F) -> AppResult<FlushReport>
    where
        F: Fn(AssignmentRequest) -> Fut,
        Fut: Future<Output = AppResult<Assignment>>,
    {
        let Ok(_flight) = self.flushing.try_lock() else {
            tracing::debug!("Outbox flush already running, skipping");
            return Ok(FlushReport {
                skipped: true,
                ..FlushReport::default()
            });
        };

        let snapshot = self.pending().await;
        if snapshot.is_empty() {
            return Ok(FlushReport::default());
        }

        let mut report = FlushReport::default();
        let mut accepted: Vec<(Uuid, Assignment)> = Vec::new();
        let mut rejected: Vec<(Uuid, String)> = Vec::new();
        let mut failures: Vec<(Uuid, String)> = Vec::new();

        for entry in &snapshot {
            match send(entry.request.clone()).await {
                Ok(assignment) => accepted.push((entry.id, assignment)),
                Err(AppError::Cancelled) => {
                    tracing::info!("Outbox flush cancelled");
                    break;
                }
                Err(e) if e.is_unauthorized() => {
                    tracing::warn!("Outbox flush stopped, backend refused the token: {}", e);
                    return Err(e);
                }
                Err(e) if e.is_rejection() => {
                    tracing::warn!(
                        "Assignment of lead {} refused by the backend, dropping it: {}",
                        entry.request.lead_id,
                        e
                    );
                    rejected.push((entry.id, e.to_string()));
                }
                Err(e) => {
                    tracing::warn!(
                        "Assignment of lead {} still failing after {} attempts: {}",
                        entry.request.lead_id,
                        entry.attempts,
                        e
                    );
                    failures.push((entry.id, e.to_string()));
                }
            }
        }

        let _guard = self.lock.lock().await;
        let mut entries = self.pending().await;
        // Anything whose id is gone was replaced by a newer write mid-flush.
        for (id, assignment) in accepted.iter() {
            if entries.iter().any(|e| e.id == *id) {
                report.confirmed.push(assignment.clone());
            } else {
                tracing::info!(
                    "Assignment of lead {} was superseded while syncing",
                    assignment.lead_id
                );
            }
        }
        for entry in entries.iter() {
            if let Some((_, error)) = rejected.iter().find(|(id, _)| *id == entry.id) {
                report.rejected.push(PendingAssignment {
                    last_error: Some(error.clone()),
                    ..entry.clone()
                });
            }
        }
        entries.retain(|e| {
            !accepted.iter().any(|(id, _)| *id == e.id) && !rejected.iter().any(|(id, _)| *id == e.id)
        });
        for entry in entries.iter_mut() {
            if let Some((_, error)) = failures.iter().find(|(id, _)| *id == entry.id) {
                entry.attempts += 1;
                entry.last_error = Some(error.clone());
            }
        }
        self.save(&entries).await?;

        report.sent = accepted.len();
        report.failed = failures.len();
        report.remaining = entries.len();
        if report.sent > 0 || report.failed > 0 || !report.rejected.is_empty() {
            tracing::info!(
                "Outbox flush: {} sent, {} failed, {} rejected, {} remaining",
                report.sent,
                report.failed,
                report.rejected.len(),
                report.remaining
            );
        }
        Ok(report)
    }

    async fn save(&self, entries: &[PendingAssignment]) -> AppResult<()> {
        if entries.is_empty() {
            self.store.remove(OUTBOX_KEY).await
        } else {
            self.store.set_json(OUTBOX_KEY, entries).await
        }
    }
}
