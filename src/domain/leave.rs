use crate::domain::models::{LeaveRequest, LeaveStatus};
use crate::error::{AppError, AppResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveApplication {
    #[serde(default)]
    pub leave_type: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub reason: String,
}

/// Checked form of a [`LeaveApplication`], ready to be sent.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ValidLeave {
    pub leave_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

impl LeaveApplication {
    pub fn validate(&self) -> AppResult<ValidLeave> {
        let leave_type = self.leave_type.trim();
        if leave_type.is_empty() {
            return Err(AppError::validation("leave type is required"));
        }
        let start_date = self
            .start_date
            .ok_or_else(|| AppError::validation("start date is required"))?;
        let end_date = self
            .end_date
            .ok_or_else(|| AppError::validation("end date is required"))?;
        if end_date < start_date {
            return Err(AppError::validation("end date cannot be before start date"));
        }
        let reason = self.reason.trim();
        if reason.is_empty() {
            return Err(AppError::validation("reason is required"));
        }
        Ok(ValidLeave {
            leave_type: leave_type.to_lowercase(),
            start_date,
            end_date,
            reason: reason.to_string(),
        })
    }
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
        }
    }
}

/// Inclusive number of calendar days covered.
pub fn day_count(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

#[derive(Debug, Clone, PartialEq)]
pub enum LeaveDecision {
    Approve,
    Reject { message: String },
}

/// Only pending requests can be decided, and a rejection needs a message.
pub fn check_decision(request: &LeaveRequest, decision: &LeaveDecision) -> AppResult<()> {
    if request.status != LeaveStatus::Pending {
        return Err(AppError::validation(format!(
            "leave request {} is already {}",
            request.id,
            request.status.as_str()
        )));
    }
    if let LeaveDecision::Reject { message } = decision {
        if message.trim().is_empty() {
            return Err(AppError::validation("a rejection message is required"));
        }
    }
    Ok(())
}
