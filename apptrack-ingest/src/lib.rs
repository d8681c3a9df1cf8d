//! apptrack-ingest: load a user's portfolio snapshot from JSON or a directory of
//! CSV exports, and read/write cached risk reports.

pub mod parsers;
pub mod types;

pub use parsers::fields::{parse_deadline_type, parse_hours, parse_task_status, parse_task_type};
pub use parsers::portfolio_csv::{APPLICATIONS_CSV, DEADLINES_CSV, TASKS_CSV, load_snapshot_dir};
pub use parsers::snapshot_json::{load_report_json, load_snapshot_json, save_json};
pub use types::{ApplicationRow, DeadlineRow, SnapshotSource, TaskRow};

use anyhow::Result;
use apptrack_core::Snapshot;
use std::path::Path;

/// Load a snapshot from either a `.json` file or a CSV directory.
///
/// `user_id` is only used for CSV directories; JSON snapshots carry their own.
pub fn load_snapshot(path: impl AsRef<Path>, user_id: &str) -> Result<Snapshot> {
    let path = path.as_ref();
    match SnapshotSource::detect(path) {
        SnapshotSource::CsvDir => load_snapshot_dir(path, user_id),
        SnapshotSource::Json => load_snapshot_json(path),
    }
}
