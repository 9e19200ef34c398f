use crate::domain::lead::{Lead, LeadAssignment};
use crate::domain::models::{Assignment, SalesUser};
use std::collections::HashMap;

/// Keeps one assignment per lead id; later entries in `assignments` win.
pub fn latest_by_lead(assignments: &[Assignment]) -> HashMap<&str, &Assignment> {
    let mut latest = HashMap::with_capacity(assignments.len());
    for assignment in assignments {
        latest.insert(assignment.lead_id.as_str(), assignment);
    }
    latest
}

pub fn to_lead_assignment(assignment: &Assignment, users: &[SalesUser], pending_sync: bool) -> LeadAssignment {
    let assigned_to_name = assignment
        .assigned_to_name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .or_else(|| {
            users
                .iter()
                .find(|u| u.id == assignment.assigned_to)
                .map(|u| u.name.clone())
                .filter(|name| !name.is_empty())
        });

    LeadAssignment {
        assigned_to: assignment.assigned_to.clone(),
        assigned_role: assignment.assigned_role.clone(),
        assigned_to_name,
        assignment_notes: assignment.notes.clone(),
        assignment_date: assignment.effective_date(),
        pending_sync,
    }
}

/// Copies assignee fields onto every lead with a matching assignment.
/// Leads without one are left untouched. Returns how many leads were updated.
pub fn reconcile(leads: &mut [Lead], assignments: &[Assignment], users: &[SalesUser]) -> usize {
    overlay(leads, assignments, users, false)
}

/// Same as [`reconcile`] but marks the copied assignments as awaiting sync.
pub fn overlay_pending(leads: &mut [Lead], assignments: &[Assignment], users: &[SalesUser]) -> usize {
    overlay(leads, assignments, users, true)
}

fn overlay(leads: &mut [Lead], assignments: &[Assignment], users: &[SalesUser], pending_sync: bool) -> usize {
    if assignments.is_empty() {
        return 0;
    }
    let latest = latest_by_lead(assignments);
    let mut updated = 0;
    for lead in leads.iter_mut() {
        if let Some(assignment) = latest.get(lead.id.as_str()) {
            lead.assignment = Some(to_lead_assignment(assignment, users, pending_sync));
            updated += 1;
        }
    }
    updated
}
