//! JSON snapshots and cached risk reports.

use anyhow::{Context, Result};
use apptrack_core::{RiskReport, Snapshot};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

pub fn load_snapshot_json(path: impl AsRef<Path>) -> Result<Snapshot> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let snapshot: Snapshot =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    info!(
        path = %path.display(),
        user_id = %snapshot.user_id,
        tasks = snapshot.tasks.len(),
        deadlines = snapshot.deadlines.len(),
        "loaded json snapshot"
    );
    Ok(snapshot)
}

/// A report saved by an earlier run, e.g. `apptrack alerts --save`.
pub fn load_report_json(path: impl AsRef<Path>) -> Result<RiskReport> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let report: RiskReport =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    Ok(report)
}

/// Pretty-printed JSON, creating parent directories as needed.
pub fn save_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let body = serde_json::to_string_pretty(value)?;
    fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use apptrack_core::{Application, Deadline, DeadlineType, Engine, Task, TaskType};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_snapshot_json_uses_snake_case_enums() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("snap.json");
        fs::write(
            &path,
            r#"{
                "user_id": "u1",
                "tasks": [{
                    "id": "t1", "owner_id": "u1", "task_type": "essay",
                    "estimated_hours": 4.0, "status": "in_progress", "priority": 1
                }],
                "applications": [], "deadlines": [], "edges": []
            }"#,
        )
        .unwrap();

        let s = load_snapshot_json(&path).unwrap();
        assert_eq!(s.tasks[0].task_type, TaskType::Essay);
        assert_eq!(s.tasks[0].application_id, None);
    }

    #[test]
    fn test_save_then_load_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("snap.json");
        let mut s = Snapshot::new("u1");
        s.tasks.push(Task::new("t1", "u1", TaskType::Form).with_estimate(0.5));

        save_json(&path, &s).unwrap();
        assert_eq!(load_snapshot_json(&path).unwrap(), s);
    }

    #[test]
    fn test_saved_report_keeps_excluded_deadlines() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
        let mut s = Snapshot::new("u1");
        s.applications.push(Application::new("a1", "c1", "Brown", "US"));
        s.tasks.push(Task::new("t1", "u1", TaskType::Essay).for_application("a1").with_estimate(3.0));
        let mut done = Deadline::new("d-done", "a1", DeadlineType::Personal, now + Duration::hours(5));
        done.is_completed = true;
        s.deadlines.push(done);
        s.deadlines.push(Deadline::new("d-ed", "a1", DeadlineType::EarlyDecision, now + Duration::hours(48)));

        let report = Engine::default().recompute(&s, now).unwrap().report;
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("report.json");
        save_json(&path, &report).unwrap();

        let cached = load_report_json(&path).unwrap();
        assert_eq!(cached, report);
        assert_eq!(cached.get("d-done").unwrap(), None);
        assert!(cached.get("d-ed").unwrap().is_some());
        assert!(cached.get("d-missing").is_err());
    }

    #[test]
    fn test_bad_json_names_the_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_snapshot_json(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.json"));
    }
}
