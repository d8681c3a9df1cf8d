//! DependencyResolver: live blocked/actionable state.
//!
//! The resolver never rewrites stored statuses. When the derived state disagrees
//! with what the student recorded (say `in_progress` on a task whose essay draft
//! is still open) the disagreement is exposed as `display_status`, and the
//! stored value is left for the explicit write path.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::graph::DependencyGraph;
use crate::task::{Task, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTask {
    pub task_id: String,
    pub stored_status: TaskStatus,
    pub display_status: TaskStatus,
    /// Every direct blocker is settled.
    pub actionable: bool,
    /// Complete, skipped or retired.
    pub settled: bool,
    /// Direct blockers that are not settled yet, sorted.
    pub open_blockers: Vec<String>,
}

impl ResolvedTask {
    pub fn diverges(&self) -> bool {
        self.stored_status != self.display_status
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    tasks: BTreeMap<String, ResolvedTask>,
}

pub struct DependencyResolver;

impl DependencyResolver {
    pub fn resolve(graph: &DependencyGraph, tasks: &[Task]) -> Result<Resolution> {
        let by_id: BTreeMap<&str, &Task> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();
        let mut resolved = BTreeMap::new();

        for task in tasks {
            let mut open_blockers = Vec::new();
            for blocker_id in graph.depends_on(&task.id)? {
                let blocker = by_id.get(blocker_id).ok_or_else(|| {
                    EngineError::unknown_task(blocker_id, format!("blocker of '{}'", task.id))
                })?;
                if !blocker.is_settled() {
                    open_blockers.push(blocker_id.to_string());
                }
            }

            let actionable = open_blockers.is_empty();
            let settled = task.is_settled();
            let display_status = match (settled, actionable, task.status) {
                (true, _, stored) => stored,
                (false, false, _) => TaskStatus::Blocked,
                (false, true, TaskStatus::Blocked) => TaskStatus::NotStarted,
                (false, true, stored) => stored,
            };

            resolved.insert(
                task.id.clone(),
                ResolvedTask {
                    task_id: task.id.clone(),
                    stored_status: task.status,
                    display_status,
                    actionable,
                    settled,
                    open_blockers,
                },
            );
        }

        Ok(Resolution { tasks: resolved })
    }
}

impl Resolution {
    pub fn get(&self, task_id: &str) -> Result<&ResolvedTask> {
        self.tasks
            .get(task_id)
            .ok_or_else(|| EngineError::unknown_task(task_id, "not in resolution"))
    }

    pub fn is_actionable(&self, task_id: &str) -> Result<bool> {
        Ok(self.get(task_id)?.actionable)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedTask> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Open tasks the student can work on right now.
    pub fn actionable_open(&self) -> impl Iterator<Item = &ResolvedTask> {
        self.tasks.values().filter(|t| t.actionable && !t.settled)
    }

    /// Open dependents whose only remaining blocker is `task_id`: settling it
    /// would make them actionable.
    pub fn unblocked_by(&self, task_id: &str) -> Result<Vec<&str>> {
        self.get(task_id)?;
        Ok(self
            .tasks
            .values()
            .filter(|t| !t.settled && t.open_blockers.len() == 1 && t.open_blockers[0] == task_id)
            .map(|t| t.task_id.as_str())
            .collect())
    }

    /// Open tasks that are actionable now but were blocked in `previous`. The
    /// engine reports these; it does not start them.
    pub fn newly_actionable(&self, previous: &Resolution) -> Vec<&str> {
        self.actionable_open()
            .filter(|t| {
                previous
                    .tasks
                    .get(&t.task_id)
                    .is_some_and(|before| !before.actionable)
            })
            .map(|t| t.task_id.as_str())
            .collect()
    }

    /// Write-path guard: a task cannot be completed while it is blocked.
    pub fn check_transition(&self, task_id: &str, to: TaskStatus) -> Result<()> {
        let t = self.get(task_id)?;
        if to == TaskStatus::Complete && !t.actionable {
            return Err(EngineError::BlockedTransition {
                task_id: task_id.to_string(),
                to,
                open_blockers: t.open_blockers.clone(),
            });
        }
        Ok(())
    }
}
