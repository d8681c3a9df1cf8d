//! Engine error taxonomy.
//!
//! Every variant describes a data-correctness problem in the snapshot the caller
//! handed us, so none of them are retryable. Each carries the ids needed to fix
//! the underlying records.

use crate::task::TaskStatus;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("cyclic dependency between tasks: {}", .task_ids.join(" -> "))]
    CyclicDependency { task_ids: Vec<String> },

    #[error("unknown task '{task_id}' ({context})")]
    UnknownTask { task_id: String, context: String },

    #[error("unknown deadline '{deadline_id}'")]
    UnknownDeadline { deadline_id: String },

    #[error("unknown application '{application_id}' ({context})")]
    UnknownApplication {
        application_id: String,
        context: String,
    },

    #[error("invalid {field} on task '{task_id}': {value}")]
    InvalidEstimate {
        task_id: String,
        field: &'static str,
        value: String,
    },

    #[error("task '{task_id}' is owned by '{owner_id}', expected '{expected_owner}'")]
    ForeignTask {
        task_id: String,
        owner_id: String,
        expected_owner: String,
    },

    #[error("duplicate task id '{task_id}'")]
    DuplicateTask { task_id: String },

    #[error("task '{task_id}' cannot move to {to:?} while blocked by: {}", .open_blockers.join(", "))]
    BlockedTransition {
        task_id: String,
        to: TaskStatus,
        open_blockers: Vec<String>,
    },

    #[error("invalid policy: {0}")]
    InvalidPolicy(String),
}

impl EngineError {
    pub(crate) fn unknown_task(task_id: impl Into<String>, context: impl Into<String>) -> Self {
        Self::UnknownTask {
            task_id: task_id.into(),
            context: context.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_lists_participants_in_order() {
        let err = EngineError::CyclicDependency {
            task_ids: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "cyclic dependency between tasks: a -> b -> a");
    }

    #[test]
    fn blocked_transition_names_open_blockers() {
        let err = EngineError::BlockedTransition {
            task_id: "t2".into(),
            to: TaskStatus::Complete,
            open_blockers: vec!["t1".into(), "t0".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("t2"));
        assert!(msg.contains("t1, t0"));
    }
}
