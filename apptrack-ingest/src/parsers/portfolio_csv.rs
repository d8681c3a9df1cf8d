//! Portfolio snapshot from a directory of CSV exports.
//!
//!   applications.csv  id,college_id,college_name,country,shared_tasks,withdrawn
//!   tasks.csv         id,application_id,type,title,estimate,actual,status,progress,priority,reusable,blocked_by
//!   deadlines.csv     id,application_id,type,title,due,timezone,completed,active
//!
//! Unlike statement imports, a bad row is an error: skipping a task would
//! silently under-count the work a deadline needs.

use anyhow::{Context, Result};
use apptrack_core::{
    Application, BlockingEdge, Deadline, Snapshot, Task, parse_local_deadline_to_utc,
};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, info};

use crate::parsers::fields::{
    parse_deadline_type, parse_flag, parse_hours, parse_id_list, parse_optional_hours,
    parse_percent, parse_priority, parse_task_status, parse_task_type,
};
use crate::types::{ApplicationRow, DeadlineRow, TaskRow};

pub const APPLICATIONS_CSV: &str = "applications.csv";
pub const TASKS_CSV: &str = "tasks.csv";
pub const DEADLINES_CSV: &str = "deadlines.csv";

/// Read `file` into typed rows, paired with their 1-based line number.
fn read_rows<T: DeserializeOwned>(file: &Path) -> Result<Vec<(u64, T)>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file)
        .with_context(|| format!("opening {}", file.display()))?;
    let headers = rdr
        .headers()
        .with_context(|| format!("reading header of {}", file.display()))?
        .clone();

    let mut out = Vec::new();
    let mut record = csv::StringRecord::new();
    loop {
        let more = rdr
            .read_record(&mut record)
            .with_context(|| format!("reading {}", file.display()))?;
        if !more {
            break;
        }
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        let row: T = record
            .deserialize(Some(&headers))
            .with_context(|| format!("{}:{}: malformed row", file.display(), line))?;
        out.push((line, row));
    }
    Ok(out)
}

pub fn parse_application_row(row: ApplicationRow) -> Result<Application> {
    let mut app = Application::new(row.id, row.college_id, row.college_name, row.country);
    app.shared_task_ids = parse_id_list(&row.shared_tasks);
    app.withdrawn = parse_flag(&row.withdrawn, false).context("withdrawn")?;
    Ok(app)
}

/// One task plus the blocking edges declared on its row.
pub fn parse_task_row(row: TaskRow, user_id: &str) -> Result<(Task, Vec<BlockingEdge>)> {
    let task_type = parse_task_type(&row.task_type).context("type")?;
    let mut task = Task::new(row.id.clone(), user_id, task_type)
        .with_title(row.title)
        .with_estimate(parse_hours(&row.estimate).context("estimate")?)
        .with_status(parse_task_status(&row.status).context("status")?)
        .with_priority(parse_priority(&row.priority)?)
        .with_progress(parse_percent(&row.progress)?);

    task = if row.application_id.is_empty() {
        task.shared()
    } else {
        task.for_application(row.application_id)
    };
    task.is_reusable = parse_flag(&row.reusable, task.is_reusable).context("reusable")?;
    task.actual_hours = parse_optional_hours(&row.actual).context("actual")?;

    let edges = parse_id_list(&row.blocked_by)
        .into_iter()
        .map(|blocker| BlockingEdge::new(row.id.clone(), blocker))
        .collect();
    Ok((task, edges))
}

pub fn parse_deadline_row(row: DeadlineRow) -> Result<Deadline> {
    let deadline_type = parse_deadline_type(&row.deadline_type).context("type")?;
    let tz = if row.timezone.is_empty() {
        "UTC"
    } else {
        row.timezone.as_str()
    };
    let due = parse_local_deadline_to_utc(&row.due, tz).context("due")?;

    let mut deadline = Deadline::new(row.id, row.application_id, deadline_type, due).with_title(row.title);
    deadline.is_completed = parse_flag(&row.completed, false).context("completed")?;
    deadline.is_active = parse_flag(&row.active, true).context("active")?;
    Ok(deadline)
}

/// Load `applications.csv`, `tasks.csv` and `deadlines.csv` from `dir`.
///
/// All tasks are owned by `user_id`. A missing `deadlines.csv` is allowed (no
/// deadlines yet); the other two files are required.
pub fn load_snapshot_dir(dir: impl AsRef<Path>, user_id: &str) -> Result<Snapshot> {
    let dir = dir.as_ref();
    let mut snapshot = Snapshot::new(user_id);

    let apps_path = dir.join(APPLICATIONS_CSV);
    for (line, row) in read_rows::<ApplicationRow>(&apps_path)? {
        let app = parse_application_row(row)
            .with_context(|| format!("{}:{}", apps_path.display(), line))?;
        snapshot.applications.push(app);
    }

    let tasks_path = dir.join(TASKS_CSV);
    for (line, row) in read_rows::<TaskRow>(&tasks_path)? {
        let (task, edges) = parse_task_row(row, user_id)
            .with_context(|| format!("{}:{}", tasks_path.display(), line))?;
        snapshot.tasks.push(task);
        snapshot.edges.extend(edges);
    }

    let deadlines_path = dir.join(DEADLINES_CSV);
    if deadlines_path.exists() {
        for (line, row) in read_rows::<DeadlineRow>(&deadlines_path)? {
            let deadline = parse_deadline_row(row)
                .with_context(|| format!("{}:{}", deadlines_path.display(), line))?;
            snapshot.deadlines.push(deadline);
        }
    } else {
        debug!(path = %deadlines_path.display(), "no deadlines file");
    }

    info!(
        dir = %dir.display(),
        applications = snapshot.applications.len(),
        tasks = snapshot.tasks.len(),
        deadlines = snapshot.deadlines.len(),
        edges = snapshot.edges.len(),
        "loaded csv snapshot"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apptrack_core::{DeadlineType, TaskStatus, TaskType};
    use std::fs;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn test_task_row_defaults_and_edges() {
        let row = TaskRow {
            id: "t2".into(),
            application_id: "a1".into(),
            task_type: "rec".into(),
            title: "Ask Ms. Lee".into(),
            estimate: "90m".into(),
            blocked_by: "t1;t0".into(),
            ..TaskRow::default()
        };
        let (task, edges) = parse_task_row(row, "u1").unwrap();
        assert_eq!(task.owner_id, "u1");
        assert_eq!(task.task_type, TaskType::Recommendation);
        assert_eq!(task.estimated_hours, 1.5);
        assert_eq!(task.status, TaskStatus::NotStarted);
        assert_eq!(task.priority, 2);
        assert!(!task.is_reusable);
        assert_eq!(edges, vec![BlockingEdge::new("t2", "t1"), BlockingEdge::new("t2", "t0")]);
    }

    #[test]
    fn test_blank_application_makes_a_shared_task() {
        let row = TaskRow {
            id: "ps".into(),
            task_type: "essay".into(),
            estimate: "10h".into(),
            ..TaskRow::default()
        };
        let (task, _) = parse_task_row(row, "u1").unwrap();
        assert_eq!(task.application_id, None);
        assert!(task.is_reusable);
    }

    #[test]
    fn test_deadline_row_converts_local_time() {
        let row = DeadlineRow {
            id: "d1".into(),
            application_id: "a1".into(),
            deadline_type: "EA".into(),
            due: "2026-10-20 12:00".into(),
            timezone: "America/Chicago".into(),
            ..DeadlineRow::default()
        };
        let d = parse_deadline_row(row).unwrap();
        assert_eq!(d.deadline_type, DeadlineType::EarlyAction);
        // CDT, UTC-5
        assert_eq!(d.deadline_date.to_rfc3339(), "2026-10-20T17:00:00+00:00");
        assert!(d.is_active);
        assert!(!d.is_completed);
    }

    #[test]
    fn test_load_dir_reports_file_and_line() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            APPLICATIONS_CSV,
            "id,college_id,college_name,country,shared_tasks,withdrawn\na1,c1,Rice,US,,\n",
        );
        write(
            tmp.path(),
            TASKS_CSV,
            "id,application_id,type,title,estimate,actual,status,progress,priority,reusable,blocked_by\n\
             t1,a1,essay,Why Rice,3h,,,,,,\n\
             t2,a1,essay,Short answers,lots,,,,,,\n",
        );

        let err = load_snapshot_dir(tmp.path(), "u1").unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("tasks.csv:3"), "got: {}", msg);
        assert!(msg.contains("estimate"), "got: {}", msg);
    }

    #[test]
    fn test_load_dir_without_deadlines_file() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            APPLICATIONS_CSV,
            "id,college_id,college_name,country,shared_tasks,withdrawn\na1,c1,Rice,US,,\n",
        );
        write(
            tmp.path(),
            TASKS_CSV,
            "id,application_id,type,title,estimate,actual,status,progress,priority,reusable,blocked_by\n\
             t1,a1,essay,Why Rice,3h,,done,100,1,,\n",
        );

        let s = load_snapshot_dir(tmp.path(), "u1").unwrap();
        assert_eq!(s.tasks.len(), 1);
        assert_eq!(s.tasks[0].status, TaskStatus::Complete);
        assert!(s.deadlines.is_empty());
    }

    #[test]
    fn test_missing_tasks_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            APPLICATIONS_CSV,
            "id,college_id,college_name,country,shared_tasks,withdrawn\n",
        );
        let err = load_snapshot_dir(tmp.path(), "u1").unwrap_err();
        assert!(format!("{:#}", err).contains("tasks.csv"));
    }
}
