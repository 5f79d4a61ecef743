//! Task records and their input types.
//!
//! A task is created incomplete, edited through [`TaskPatch`], toggled
//! between complete and incomplete, or deleted. The completion flag and the
//! completion timestamp only change together:
//!
//! ```text
//!   incomplete ──complete──> completed (completed_at = now)
//!        ^                        |
//!        +────────reopen──────────+  (completed_at = None)
//! ```

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 2000;

/// Category of task for organizing work.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Work,
    Study,
    Personal,
    Urgent,
}

impl TaskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Work => "work",
            TaskCategory::Study => "study",
            TaskCategory::Personal => "personal",
            TaskCategory::Urgent => "urgent",
        }
    }
}

impl Default for TaskCategory {
    fn default() -> Self {
        TaskCategory::Personal
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "work" => Ok(TaskCategory::Work),
            "study" => Ok(TaskCategory::Study),
            "personal" => Ok(TaskCategory::Personal),
            "urgent" => Ok(TaskCategory::Urgent),
            other => Err(ValidationError::field(
                "category",
                format!("unknown category '{other}' (expected work, study, personal or urgent)"),
            )),
        }
    }
}

/// Task priority. Drives the XP awarded on completion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(ValidationError::field(
                "priority",
                format!("unknown priority '{other}' (expected low, medium or high)"),
            )),
        }
    }
}

/// A task owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Unique identifier
    pub id: String,
    /// Owning user
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: TaskCategory,
    pub priority: TaskPriority,
    pub due_at: Option<DateTime<Utc>>,
    /// Whether the task is completed. Only changed via `mark_completed`/`reopen`.
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    /// Set iff `completed`.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Build a new incomplete task from a validated draft.
    pub fn from_draft(user_id: impl Into<String>, draft: TaskDraft, now: DateTime<Utc>) -> Self {
        Task {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            title: draft.title.trim().to_string(),
            description: normalize_description(draft.description),
            category: draft.category,
            priority: draft.priority,
            due_at: draft.due_at,
            completed: false,
            created_at: now,
            completed_at: None,
        }
    }

    pub fn mark_completed(&mut self, at: DateTime<Utc>) {
        self.completed = true;
        self.completed_at = Some(at);
    }

    pub fn reopen(&mut self) {
        self.completed = false;
        self.completed_at = None;
    }

    /// Whether the task was completed on the same local calendar day as `today`.
    pub fn completed_on(&self, today: chrono::NaiveDate) -> bool {
        self.completed_at
            .map(|at| at.with_timezone(&Local).date_naive() == today)
            .unwrap_or(false)
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_at.map(|due| due < now).unwrap_or(false)
    }

    /// Apply an edit. Completion state is not part of a patch.
    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(ref title) = patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(ref description) = patch.description {
            self.description = normalize_description(description.clone());
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(due_at) = patch.due_at {
            self.due_at = due_at;
        }
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

/// Input for creating a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: TaskCategory,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn category(mut self, category: TaskCategory) -> Self {
        self.category = category;
        self
    }

    pub fn priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn due_at(mut self, due_at: DateTime<Utc>) -> Self {
        self.due_at = Some(due_at);
        self
    }

    /// Reject malformed input before it reaches the store.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        validate_description(self.description.as_deref())
    }
}

/// Partial update for a task. `None` leaves a field unchanged; for the
/// optional fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub category: Option<TaskCategory>,
    pub priority: Option<TaskPriority>,
    pub due_at: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.priority.is_none()
            && self.due_at.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(ref title) = self.title {
            validate_title(title)?;
        }
        if let Some(ref description) = self.description {
            validate_description(description.as_deref())?;
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::field("title", "must not be empty"));
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::field(
            "title",
            format!("must be at most {MAX_TITLE_LEN} characters"),
        ));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> Result<(), ValidationError> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => Err(ValidationError::field(
            "description",
            format!("must be at most {MAX_DESCRIPTION_LEN} characters"),
        )),
        _ => Ok(()),
    }
}

/// Listing filter. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub category: Option<TaskCategory>,
    pub priority: Option<TaskPriority>,
    pub completed: Option<bool>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.category.map_or(true, |c| task.category == c)
            && self.priority.map_or(true, |p| task.priority == p)
            && self.completed.map_or(true, |c| task.completed == c)
    }
}

/// Summary counts over a task list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub completed_today: usize,
    pub overdue: usize,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[Task], now: DateTime<Utc>) -> Self {
        let today = now.with_timezone(&Local).date_naive();
        let completed = tasks.iter().filter(|t| t.completed).count();
        TaskStats {
            total: tasks.len(),
            completed,
            pending: tasks.len() - completed,
            completed_today: tasks.iter().filter(|t| t.completed_on(today)).count(),
            overdue: tasks.iter().filter(|t| t.is_overdue(now)).count(),
        }
    }
}
