use crate::domain::models::Assignment;
use crate::error::AppResult;
use crate::storage::local_store::LocalStore;
use std::sync::Arc;

pub const ASSIGNMENTS_KEY: &str = "bharat_crm_lead_assignments";

/// Last known assignment list, served when the backend cannot be reached.
#[derive(Clone)]
pub struct AssignmentCache {
    store: Arc<LocalStore>,
}

impl AssignmentCache {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self) -> Vec<Assignment> {
        match self.store.get_json::<Vec<Assignment>>(ASSIGNMENTS_KEY).await {
            Ok(Some(assignments)) => assignments,
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Cached assignments are unreadable, ignoring them: {}", e);
                Vec::new()
            }
        }
    }

    /// Replaces the snapshot wholesale.
    pub async fn save(&self, assignments: &[Assignment]) -> AppResult<()> {
        self.store.set_json(ASSIGNMENTS_KEY, assignments).await
    }

    /// Records one confirmed assignment, superseding any earlier one for the same lead.
    pub async fn upsert(&self, assignment: Assignment) -> AppResult<()> {
        let mut assignments = self.load().await;
        assignments.retain(|a| a.lead_id != assignment.lead_id);
        assignments.push(assignment);
        self.save(&assignments).await
    }
}
