use crate::domain::fields::{de_id, de_opt_id, de_opt_timestamp};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SalesRole {
    SalesExecutive,
    SalesManager,
    AccountManager,
    SupportAgent,
    Admin,
}

impl SalesRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalesRole::SalesExecutive => "sales_executive",
            SalesRole::SalesManager => "sales_manager",
            SalesRole::AccountManager => "account_manager",
            SalesRole::SupportAgent => "support_agent",
            SalesRole::Admin => "admin",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SalesRole::SalesExecutive => "Sales Executive",
            SalesRole::SalesManager => "Sales Manager",
            SalesRole::AccountManager => "Account Manager",
            SalesRole::SupportAgent => "Support Agent",
            SalesRole::Admin => "Admin",
        }
    }
}

impl TryFrom<&str> for SalesRole {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "sales_executive" => Ok(SalesRole::SalesExecutive),
            "sales_manager" => Ok(SalesRole::SalesManager),
            "account_manager" => Ok(SalesRole::AccountManager),
            "support_agent" => Ok(SalesRole::SupportAgent),
            "admin" => Ok(SalesRole::Admin),
            _ => Err(()),
        }
    }
}

/// Backend record mapping one lead to its current assignee.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assignment {
    #[serde(deserialize_with = "de_id", alias = "leadId")]
    pub lead_id: String,
    #[serde(deserialize_with = "de_id", alias = "assignee_id", alias = "user_id")]
    pub assigned_to: String,
    #[serde(alias = "role")]
    pub assigned_role: String,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "assignee_name")]
    pub assigned_to_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "assignment_notes")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_opt_id")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_opt_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_opt_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Assignment {
    /// `updated_at` when present, otherwise `created_at`.
    pub fn effective_date(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.created_at)
    }
}

/// A create-or-replace assignment write as sent to the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignmentRequest {
    pub lead_id: String,
    pub assigned_to: String,
    pub assigned_role: SalesRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl AssignmentRequest {
    pub fn validate(mut self) -> AppResult<Self> {
        self.lead_id = self.lead_id.trim().to_string();
        self.assigned_to = self.assigned_to.trim().to_string();
        if self.lead_id.is_empty() {
            return Err(AppError::validation("lead id is required"));
        }
        if self.assigned_to.is_empty() {
            return Err(AppError::validation("select a team member to assign"));
        }
        self.notes = self.notes.filter(|n| !n.trim().is_empty());
        Ok(self)
    }

    /// The assignment this write would produce, stamped at `at`.
    pub fn to_assignment(&self, at: DateTime<Utc>) -> Assignment {
        Assignment {
            lead_id: self.lead_id.clone(),
            assigned_to: self.assigned_to.clone(),
            assigned_role: self.assigned_role.as_str().to_string(),
            assigned_to_name: self.assigned_to_name.clone(),
            notes: self.notes.clone(),
            created_by: None,
            created_at: Some(at),
            updated_at: Some(at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SalesUser {
    #[serde(deserialize_with = "de_id", alias = "_id", alias = "user_id")]
    pub id: String,
    #[serde(default, alias = "full_name", alias = "fullName")]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub role: SalesRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeadSource {
    #[serde(deserialize_with = "de_id", alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(alias = "type")]
    pub source_type: String,
    #[serde(default, alias = "lead_count")]
    pub total_leads: u64,
    #[serde(default, alias = "last_sync", deserialize_with = "de_opt_timestamp")]
    pub last_sync_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoLocation {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude", alias = "lng")]
    pub long: f64,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Leave,
    #[serde(alias = "half-day", alias = "halfday")]
    HalfDay,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttendanceRecord {
    #[serde(default, deserialize_with = "de_opt_id", alias = "_id")]
    pub id: Option<String>,
    #[serde(deserialize_with = "de_id", alias = "employee_id")]
    pub user_id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[serde(default, alias = "check_in_time", deserialize_with = "de_opt_timestamp")]
    pub check_in: Option<DateTime<Utc>>,
    #[serde(default, alias = "check_out_time", deserialize_with = "de_opt_timestamp")]
    pub check_out: Option<DateTime<Utc>>,
    #[serde(default)]
    pub check_in_location: Option<GeoLocation>,
    #[serde(default)]
    pub check_out_location: Option<GeoLocation>,
    #[serde(default)]
    pub working_hours: Option<f64>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaveRequest {
    #[serde(deserialize_with = "de_id", alias = "_id")]
    pub id: String,
    #[serde(deserialize_with = "de_id", alias = "employee_id")]
    pub user_id: String,
    #[serde(default, alias = "employee_name")]
    pub user_name: Option<String>,
    pub leave_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub reason: String,
    pub status: LeaveStatus,
    #[serde(default, alias = "rejection_reason")]
    pub rejection_message: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    #[serde(alias = "pending")]
    Todo,
    InProgress,
    Review,
    #[serde(alias = "completed")]
    Done,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    #[serde(deserialize_with = "de_id", alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Role {
    #[serde(deserialize_with = "de_id", alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Role {
    /// `*` grants every permission.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .iter()
            .any(|p| p == "*" || p.eq_ignore_ascii_case(permission))
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// User-facing notification attached to a view response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_assignment_accepts_numeric_ids_and_aliases() {
        let assignment: Assignment = serde_json::from_value(json!({
            "leadId": 12,
            "user_id": 7,
            "role": "sales_manager",
            "assignment_notes": "hot lead",
            "created_at": "2024-04-01 09:00:00",
            "updated_at": "not a date"
        }))
        .unwrap();

        assert_eq!(assignment.lead_id, "12");
        assert_eq!(assignment.assigned_to, "7");
        assert_eq!(assignment.notes.as_deref(), Some("hot lead"));
        assert!(assignment.created_at.is_some());
        assert!(assignment.updated_at.is_none());
        assert_eq!(assignment.effective_date(), assignment.created_at);
    }

    #[test]
    fn test_sales_role_parsing() {
        assert_eq!(SalesRole::try_from("Sales Manager"), Ok(SalesRole::SalesManager));
        assert_eq!(SalesRole::try_from("support-agent"), Ok(SalesRole::SupportAgent));
        assert!(SalesRole::try_from("janitor").is_err());
        assert_eq!(SalesRole::AccountManager.as_str(), "account_manager");
    }

    #[test]
    fn test_task_status_aliases() {
        let task: Task = serde_json::from_value(json!({
            "_id": "t1",
            "title": "Call back",
            "status": "completed"
        }))
        .unwrap();
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.priority, TaskPriority::Medium);
    }

    #[test]
    fn test_role_permissions() {
        let role = Role {
            id: "r1".into(),
            name: "HR".into(),
            permissions: vec!["leave.approve".into(), "attendance.view".into()],
        };
        assert!(role.has_permission("leave.approve"));
        assert!(!role.has_permission("leads.assign"));

        let admin = Role {
            id: "r0".into(),
            name: "Admin".into(),
            permissions: vec!["*".into()],
        };
        assert!(admin.has_permission("leads.assign"));
    }

    #[test]
    fn test_assignment_request_validation() {
        let request = AssignmentRequest {
            lead_id: " 1 ".into(),
            assigned_to: "".into(),
            assigned_role: SalesRole::SalesManager,
            assigned_to_name: None,
            notes: None,
        };
        assert!(matches!(request.validate(), Err(AppError::Validation(_))));

        let request = AssignmentRequest {
            lead_id: " 1 ".into(),
            assigned_to: "3".into(),
            assigned_role: SalesRole::SalesManager,
            assigned_to_name: None,
            notes: Some("  ".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(request.lead_id, "1");
        assert_eq!(request.notes, None);

        let assignment = request.to_assignment(Utc::now());
        assert_eq!(assignment.assigned_role, "sales_manager");
        assert_eq!(assignment.created_at, assignment.updated_at);
    }
}
