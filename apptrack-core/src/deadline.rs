//! Deadlines and the applications they belong to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineType {
    Official,
    Internal,
    Buffer,
    Personal,
    EarlyDecision,
    EarlyAction,
    Regular,
    Priority,
    FinancialAid,
}

impl DeadlineType {
    /// Deadlines the student set for themselves and can simply move.
    pub fn is_self_imposed(self) -> bool {
        matches!(
            self,
            DeadlineType::Internal | DeadlineType::Buffer | DeadlineType::Personal
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deadline {
    pub id: String,
    pub application_id: String,
    #[serde(default)]
    pub title: String,
    pub deadline_type: DeadlineType,
    pub deadline_date: DateTime<Utc>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl Deadline {
    pub fn new(
        id: impl Into<String>,
        application_id: impl Into<String>,
        deadline_type: DeadlineType,
        deadline_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            application_id: application_id.into(),
            title: String::new(),
            deadline_type,
            deadline_date,
            is_completed: false,
            is_active: true,
            updated_at: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Open deadlines take part in risk computation.
    pub fn is_open(&self) -> bool {
        self.is_active && !self.is_completed
    }
}

/// One college application. Owned by the CRUD layer; the engine only reads it to
/// resolve which tasks a deadline needs and which college/country it rolls up to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub college_id: String,
    pub college_name: String,
    #[serde(default)]
    pub country: String,
    /// Reusable tasks (no `application_id`) this application also needs.
    #[serde(default)]
    pub shared_task_ids: Vec<String>,
    #[serde(default)]
    pub withdrawn: bool,
}

impl Application {
    pub fn new(
        id: impl Into<String>,
        college_id: impl Into<String>,
        college_name: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            college_id: college_id.into(),
            college_name: college_name.into(),
            country: country.into(),
            shared_task_ids: Vec::new(),
            withdrawn: false,
        }
    }

    pub fn with_shared_task(mut self, task_id: impl Into<String>) -> Self {
        self.shared_task_ids.push(task_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn inactive_or_completed_deadlines_are_not_open() {
        let at = Utc.with_ymd_and_hms(2026, 11, 1, 23, 59, 0).unwrap();
        let mut d = Deadline::new("d1", "a1", DeadlineType::EarlyAction, at);
        assert!(d.is_open());
        d.is_completed = true;
        assert!(!d.is_open());
        d.is_completed = false;
        d.is_active = false;
        assert!(!d.is_open());
    }

    #[test]
    fn missing_is_active_defaults_to_true() {
        let json = r#"{
            "id": "d1",
            "application_id": "a1",
            "deadline_type": "early_decision",
            "deadline_date": "2026-11-01T23:59:00Z"
        }"#;
        let d: Deadline = serde_json::from_str(json).unwrap();
        assert!(d.is_active);
        assert_eq!(d.deadline_type, DeadlineType::EarlyDecision);
    }
}
