use crate::domain::models::{AttendanceRecord, AttendanceStatus};
use chrono::{DateTime, Utc};

/// Below this many worked hours a present day counts as a half day.
pub const HALF_DAY_THRESHOLD_HOURS: f64 = 4.0;

/// Hours between check-in and check-out, rounded to two decimals.
pub fn working_hours(check_in: Option<DateTime<Utc>>, check_out: Option<DateTime<Utc>>) -> Option<f64> {
    let (check_in, check_out) = (check_in?, check_out?);
    if check_out < check_in {
        return None;
    }
    let hours = (check_out - check_in).num_seconds() as f64 / 3600.0;
    Some((hours * 100.0).round() / 100.0)
}

pub fn classify(status: AttendanceStatus, hours: Option<f64>) -> AttendanceStatus {
    match (status, hours) {
        (AttendanceStatus::Present, Some(h)) if h < HALF_DAY_THRESHOLD_HOURS => AttendanceStatus::HalfDay,
        (status, _) => status,
    }
}

impl AttendanceRecord {
    /// Fills `working_hours` from the punch times when the backend left it
    /// empty, then reclassifies short present days.
    pub fn with_derived_hours(mut self) -> Self {
        if self.working_hours.is_none() {
            self.working_hours = working_hours(self.check_in, self.check_out);
        }
        self.status = classify(self.status, self.working_hours);
        self
    }

    pub fn is_checked_in(&self) -> bool {
        self.check_in.is_some() && self.check_out.is_none()
    }
}
