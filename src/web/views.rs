//! View models for each UI region. Every region comes from exactly one
//! function here and none of them keep state between calls.

use crate::domain::filter::{LeadFilter, Page};
use crate::domain::lead::Lead;
use crate::domain::leave::day_count;
use crate::domain::models::{
    AttendanceRecord, AttendanceStatus, LeaveRequest, LeaveStatus, Notice, SalesRole, Task, TaskStatus,
};
use crate::time_utils;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

const PLACEHOLDER: &str = "-";

#[derive(Debug, Serialize)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub notices: Vec<Notice>,
}

impl<T> Listing<T> {
    pub fn new(items: Vec<T>, notices: Vec<Notice>) -> Self {
        Self { items, notices }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct LeadRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub source: String,
    pub source_label: String,
    pub campaign: String,
    pub assigned_to: Option<String>,
    pub assignee: String,
    pub assigned_role: Option<String>,
    pub role_label: Option<String>,
    pub notes: Option<String>,
    pub assignment_date: Option<NaiveDate>,
    pub pending_sync: bool,
}

#[derive(Debug, Serialize)]
pub struct LeadTable {
    pub rows: Vec<LeadRow>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
    pub filter: LeadFilter,
    pub filtered: bool,
    pub loaded_at: Option<DateTime<Utc>>,
    pub notices: Vec<Notice>,
}

pub fn source_label(source: &str) -> String {
    match source {
        "google_sheets" => "Google Sheets".to_string(),
        "meta_ads" => "Meta Ads".to_string(),
        "api" => "API".to_string(),
        "website" => "Website".to_string(),
        "manual" => "Manual Entry".to_string(),
        other => other
            .split(['_', '-', ' '])
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn lead_row(lead: &Lead) -> LeadRow {
    let source = lead.source.as_ref().or(lead.source_type.as_ref());
    let assignment = lead.assignment.as_ref();
    LeadRow {
        id: lead.id.clone(),
        name: lead.name.clone().unwrap_or_else(|| format!("Lead #{}", lead.id)),
        email: text(&lead.email),
        phone: text(&lead.phone),
        source: source.cloned().unwrap_or_default(),
        source_label: source.map(|s| source_label(s)).unwrap_or_else(|| PLACEHOLDER.to_string()),
        campaign: text(&lead.campaign),
        assigned_to: assignment.map(|a| a.assigned_to.clone()),
        assignee: match assignment {
            Some(a) => a.assigned_to_name.clone().unwrap_or_else(|| a.assigned_to.clone()),
            None => "Unassigned".to_string(),
        },
        assigned_role: assignment.map(|a| a.assigned_role.clone()),
        role_label: assignment.map(|a| {
            SalesRole::try_from(a.assigned_role.as_str())
                .map(|r| r.label().to_string())
                .unwrap_or_else(|_| a.assigned_role.clone())
        }),
        notes: assignment.and_then(|a| a.assignment_notes.clone()),
        assignment_date: assignment.and_then(|a| a.assignment_date).map(|d| d.date_naive()),
        pending_sync: assignment.is_some_and(|a| a.pending_sync),
    }
}

pub fn lead_table(
    page: Page<Lead>,
    filter: LeadFilter,
    loaded_at: Option<DateTime<Utc>>,
    notices: Vec<Notice>,
) -> LeadTable {
    let page = page.map(|lead| lead_row(&lead));
    LeadTable {
        rows: page.items,
        page: page.page,
        page_size: page.page_size,
        total: page.total,
        total_pages: page.total_pages,
        filtered: filter.is_active(),
        filter,
        loaded_at,
        notices,
    }
}

#[derive(Debug, Serialize)]
pub struct AttendanceRow {
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub check_in: String,
    pub check_out: String,
    pub working_hours: String,
    pub location: String,
    pub checked_in: bool,
}

pub fn attendance_row(record: &AttendanceRecord, timezone: &str) -> AttendanceRow {
    let local = |t: Option<DateTime<Utc>>| {
        t.map(|t| time_utils::format_local_time(timezone, t))
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    };
    AttendanceRow {
        date: record.date,
        status: record.status,
        check_in: local(record.check_in),
        check_out: local(record.check_out),
        working_hours: record
            .working_hours
            .map(|h| format!("{:.2}", h))
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        location: record
            .check_in_location
            .as_ref()
            .or(record.check_out_location.as_ref())
            .and_then(|l| l.address.clone())
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        checked_in: record.is_checked_in(),
    }
}

#[derive(Debug, Serialize)]
pub struct LeaveRow {
    pub id: String,
    pub employee: String,
    pub leave_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: i64,
    pub reason: String,
    pub status: LeaveStatus,
    pub rejection_message: Option<String>,
    pub can_review: bool,
}

pub fn leave_row(request: &LeaveRequest) -> LeaveRow {
    LeaveRow {
        id: request.id.clone(),
        employee: request.user_name.clone().unwrap_or_else(|| request.user_id.clone()),
        leave_type: request.leave_type.clone(),
        start_date: request.start_date,
        end_date: request.end_date,
        days: day_count(request.start_date, request.end_date),
        reason: request.reason.clone(),
        status: request.status,
        rejection_message: request.rejection_message.clone(),
        can_review: request.status == LeaveStatus::Pending,
    }
}

#[derive(Debug, Serialize)]
pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub assigned_to: String,
    pub due_date: Option<NaiveDate>,
    pub priority: String,
    pub status: TaskStatus,
    pub next_statuses: Vec<TaskStatus>,
}

const ALL_STATUSES: [TaskStatus; 5] = [
    TaskStatus::Todo,
    TaskStatus::InProgress,
    TaskStatus::Review,
    TaskStatus::Done,
    TaskStatus::Cancelled,
];

pub fn task_row(task: &Task) -> TaskRow {
    TaskRow {
        id: task.id.clone(),
        title: task.title.clone(),
        description: task.description.clone().unwrap_or_default(),
        assigned_to: text(&task.assigned_to),
        due_date: task.due_date,
        priority: format!("{:?}", task.priority).to_lowercase(),
        status: task.status,
        next_statuses: ALL_STATUSES
            .into_iter()
            .filter(|next| task.status.can_transition_to(*next))
            .collect(),
    }
}
