use crate::domain::models::{TaskPriority, TaskStatus};
use crate::error::{AppError, AppResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Cancelled)
    }

    /// todo -> in_progress -> review -> done, review may go back to
    /// in_progress, and any open task may be cancelled.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        match (self, next) {
            (current, Cancelled) => !current.is_terminal(),
            (Todo, InProgress) | (InProgress, Review) | (Review, Done) | (Review, InProgress) => true,
            _ => false,
        }
    }
}

pub fn check_transition(current: TaskStatus, next: TaskStatus) -> AppResult<()> {
    if current.can_transition_to(next) {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "cannot move task from {} to {}",
            current.as_str(),
            next.as_str()
        )))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: TaskPriority,
}

impl NewTask {
    pub fn validate(mut self) -> AppResult<Self> {
        self.title = self.title.trim().to_string();
        if self.title.is_empty() {
            return Err(AppError::validation("task title is required"));
        }
        self.assigned_to = self.assigned_to.filter(|a| !a.trim().is_empty());
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TaskStatus::*;

    #[test]
    fn test_workflow_transitions() {
        assert!(Todo.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Review));
        assert!(Review.can_transition_to(Done));
        assert!(Review.can_transition_to(InProgress));
        assert!(Todo.can_transition_to(Cancelled));

        assert!(!Todo.can_transition_to(Done));
        assert!(!Done.can_transition_to(InProgress));
        assert!(!Done.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Todo));
        assert!(check_transition(Todo, Review).is_err());
    }

    #[test]
    fn test_new_task_requires_title() {
        let task = NewTask {
            title: "  ".into(),
            description: None,
            assigned_to: None,
            due_date: None,
            priority: TaskPriority::High,
        };
        assert!(task.validate().is_err());

        let task = NewTask {
            title: " Follow up ".into(),
            description: None,
            assigned_to: Some(" ".into()),
            due_date: None,
            priority: TaskPriority::Low,
        }
        .validate()
        .unwrap();
        assert_eq!(task.title, "Follow up");
        assert_eq!(task.assigned_to, None);
    }
}
