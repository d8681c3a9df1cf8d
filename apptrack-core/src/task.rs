//! Task model: a unit of application work with an effort estimate.
//!
//! Tasks arrive from the storage layer as plain records. Nothing here mutates
//! stored state; derived status lives in `crate::resolver`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Essay,
    Test,
    Transcript,
    Recommendation,
    Portfolio,
    Form,
    Interview,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Blocked,
    Complete,
    Skipped,
}

impl TaskStatus {
    /// Complete or skipped: the task no longer holds anything up.
    pub fn is_done(self) -> bool {
        matches!(self, TaskStatus::Complete | TaskStatus::Skipped)
    }
}

/// Highest priority value; 1 is the most important.
pub const PRIORITY_HIGHEST: u8 = 1;
/// Lowest priority value.
pub const PRIORITY_LOWEST: u8 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub owner_id: String,
    /// `None` for a shared task reused across applications.
    #[serde(default)]
    pub application_id: Option<String>,
    #[serde(default)]
    pub title: String,
    pub task_type: TaskType,

    pub estimated_hours: f64,
    #[serde(default)]
    pub actual_hours: Option<f64>,

    pub status: TaskStatus,
    /// 0-100.
    #[serde(default)]
    pub progress_percent: u8,
    #[serde(default)]
    pub is_reusable: bool,
    /// 1-4, 1 highest.
    pub priority: u8,

    /// Soft-retired tasks stay in the snapshot while a deadline references them
    /// but behave like skipped work.
    #[serde(default)]
    pub retired: bool,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: impl Into<String>, owner_id: impl Into<String>, task_type: TaskType) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            application_id: None,
            title: String::new(),
            task_type,
            estimated_hours: 1.0,
            actual_hours: None,
            status: TaskStatus::NotStarted,
            progress_percent: 0,
            is_reusable: false,
            priority: 2,
            retired: false,
            updated_at: None,
        }
    }

    pub fn for_application(mut self, application_id: impl Into<String>) -> Self {
        self.application_id = Some(application_id.into());
        self
    }

    pub fn shared(mut self) -> Self {
        self.application_id = None;
        self.is_reusable = true;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_estimate(mut self, hours: f64) -> Self {
        self.estimated_hours = hours;
        self
    }

    pub fn with_actual(mut self, hours: f64) -> Self {
        self.actual_hours = Some(hours);
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_progress(mut self, percent: u8) -> Self {
        self.progress_percent = percent;
        self
    }

    /// Settled tasks never block and never contribute hours.
    pub fn is_settled(&self) -> bool {
        self.retired || self.status.is_done()
    }

    /// Hours of work still outstanding, floored at zero.
    pub fn remaining_hours(&self) -> f64 {
        if self.is_settled() {
            return 0.0;
        }
        (self.estimated_hours - self.actual_hours.unwrap_or(0.0)).max(0.0)
    }

    /// Completion fraction used for progress rollups (0-100).
    pub fn completion_percent(&self) -> f64 {
        if self.is_settled() {
            100.0
        } else {
            f64::from(self.progress_percent.min(100))
        }
    }

    pub fn display_name(&self) -> &str {
        if self.title.is_empty() { &self.id } else { &self.title }
    }
}

/// Declared blocking edge: `task_id` cannot be worked until `blocked_by_task_id` settles.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockingEdge {
    pub task_id: String,
    pub blocked_by_task_id: String,
}

impl BlockingEdge {
    pub fn new(task_id: impl Into<String>, blocked_by_task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            blocked_by_task_id: blocked_by_task_id.into(),
        }
    }
}
