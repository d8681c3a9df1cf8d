//! Snapshot: one user's tasks, applications, deadlines and blocking edges, as read
//! by the storage layer inside a single consistency boundary.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::deadline::{Application, Deadline};
use crate::error::{EngineError, Result};
use crate::task::{BlockingEdge, PRIORITY_HIGHEST, PRIORITY_LOWEST, Task};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub user_id: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub applications: Vec<Application>,
    #[serde(default)]
    pub deadlines: Vec<Deadline>,
    #[serde(default)]
    pub edges: Vec<BlockingEdge>,
}

impl Snapshot {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn application(&self, id: &str) -> Option<&Application> {
        self.applications.iter().find(|a| a.id == id)
    }

    pub fn deadline(&self, id: &str) -> Option<&Deadline> {
        self.deadlines.iter().find(|d| d.id == id)
    }

    /// Tasks a deadline needs directly: its application's own tasks plus the
    /// shared tasks the application lists. Sorted, deduplicated.
    pub fn direct_task_ids(&self, deadline: &Deadline) -> Vec<String> {
        let mut ids: BTreeSet<&str> = self
            .tasks
            .iter()
            .filter(|t| t.application_id.as_deref() == Some(deadline.application_id.as_str()))
            .map(|t| t.id.as_str())
            .collect();

        if let Some(app) = self.application(&deadline.application_id) {
            ids.extend(app.shared_task_ids.iter().map(String::as_str));
        }

        ids.into_iter().map(str::to_string).collect()
    }

    /// Deadlines that take part in risk computation: open, on a live application.
    pub fn evaluated_deadlines(&self) -> impl Iterator<Item = &Deadline> {
        self.deadlines.iter().filter(|d| {
            d.is_open()
                && self
                    .application(&d.application_id)
                    .is_some_and(|a| !a.withdrawn)
        })
    }

    /// Latest write across tasks and deadlines. Callers caching derived views
    /// invalidate when this moves.
    pub fn invalidation_key(&self) -> Option<DateTime<Utc>> {
        self.tasks
            .iter()
            .filter_map(|t| t.updated_at)
            .chain(self.deadlines.iter().filter_map(|d| d.updated_at))
            .max()
    }

    /// Input validation. Runs before any graph work; the first problem aborts.
    pub fn validate(&self) -> Result<()> {
        let mut seen: BTreeMap<&str, &Task> = BTreeMap::new();
        for task in &self.tasks {
            if seen.insert(task.id.as_str(), task).is_some() {
                return Err(EngineError::DuplicateTask {
                    task_id: task.id.clone(),
                });
            }
            validate_task(task)?;
            if task.owner_id != self.user_id {
                return Err(EngineError::ForeignTask {
                    task_id: task.id.clone(),
                    owner_id: task.owner_id.clone(),
                    expected_owner: self.user_id.clone(),
                });
            }
            if let Some(app_id) = &task.application_id {
                if self.application(app_id).is_none() {
                    return Err(EngineError::UnknownApplication {
                        application_id: app_id.clone(),
                        context: format!("referenced by task '{}'", task.id),
                    });
                }
            }
        }

        for app in &self.applications {
            for shared in &app.shared_task_ids {
                if !seen.contains_key(shared.as_str()) {
                    return Err(EngineError::unknown_task(
                        shared.clone(),
                        format!("shared task of application '{}'", app.id),
                    ));
                }
            }
        }

        for deadline in &self.deadlines {
            if self.application(&deadline.application_id).is_none() {
                return Err(EngineError::UnknownApplication {
                    application_id: deadline.application_id.clone(),
                    context: format!("referenced by deadline '{}'", deadline.id),
                });
            }
        }

        Ok(())
    }
}

fn validate_task(task: &Task) -> Result<()> {
    let invalid = |field: &'static str, value: String| EngineError::InvalidEstimate {
        task_id: task.id.clone(),
        field,
        value,
    };

    if !task.estimated_hours.is_finite() || task.estimated_hours < 0.0 {
        return Err(invalid("estimated_hours", task.estimated_hours.to_string()));
    }
    if let Some(actual) = task.actual_hours {
        if !actual.is_finite() || actual < 0.0 {
            return Err(invalid("actual_hours", actual.to_string()));
        }
    }
    if task.progress_percent > 100 {
        return Err(invalid("progress_percent", task.progress_percent.to_string()));
    }
    if !(PRIORITY_HIGHEST..=PRIORITY_LOWEST).contains(&task.priority) {
        return Err(invalid("priority", task.priority.to_string()));
    }
    Ok(())
}
