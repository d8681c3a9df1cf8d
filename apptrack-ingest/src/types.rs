use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotSource {
    Json,
    CsvDir,
}

impl SnapshotSource {
    pub fn detect(path: &Path) -> Self {
        if path.is_dir() {
            SnapshotSource::CsvDir
        } else {
            SnapshotSource::Json
        }
    }
}

/// Raw row of `applications.csv`. Every column is text; typing happens in
/// `parsers::portfolio_csv` so errors can name the offending line.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApplicationRow {
    pub id: String,
    pub college_id: String,
    pub college_name: String,
    #[serde(default)]
    pub country: String,
    /// `;`-separated task ids.
    #[serde(default)]
    pub shared_tasks: String,
    #[serde(default)]
    pub withdrawn: String,
}

/// Raw row of `tasks.csv`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TaskRow {
    pub id: String,
    /// Empty for shared tasks.
    #[serde(default)]
    pub application_id: String,
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default)]
    pub title: String,
    pub estimate: String,
    #[serde(default)]
    pub actual: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub progress: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub reusable: String,
    /// `;`-separated ids of tasks that must finish first.
    #[serde(default)]
    pub blocked_by: String,
}

/// Raw row of `deadlines.csv`. `due` is local wall-clock time in `timezone`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeadlineRow {
    pub id: String,
    pub application_id: String,
    #[serde(rename = "type")]
    pub deadline_type: String,
    #[serde(default)]
    pub title: String,
    pub due: String,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub completed: String,
    #[serde(default)]
    pub active: String,
}
