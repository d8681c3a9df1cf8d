use apptrack_core::{Engine, RiskLevel, TaskStatus};
use apptrack_ingest::{load_snapshot, load_snapshot_dir, load_snapshot_json, save_json};
use chrono::{DateTime, TimeZone, Utc};
use std::path::PathBuf;

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("portfolio")
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 20, 12, 0, 0).unwrap()
}

#[test]
fn loads_fixture_portfolio() {
    let s = load_snapshot_dir(fixture_dir(), "maya").expect("fixture should parse");
    assert_eq!(s.applications.len(), 3);
    assert_eq!(s.tasks.len(), 6);
    assert_eq!(s.deadlines.len(), 5);
    assert_eq!(s.edges.len(), 1);
    assert!(s.tasks.iter().all(|t| t.owner_id == "maya"));

    let ea = s.deadline("nu-ea").unwrap();
    // Chicago is back on CST by Nov 1 evening
    assert_eq!(ea.deadline_date.to_rfc3339(), "2026-11-02T05:59:00+00:00");
    assert!(s.application("a-ucl").unwrap().withdrawn);
}

#[test]
fn fixture_recomputation() {
    let s = load_snapshot(fixture_dir(), "maya").unwrap();
    let out = Engine::default().recompute(&s, now()).unwrap();

    let level = |id: &str| out.report.get(id).unwrap().map(|a| a.level);
    assert_eq!(level("nu-int"), Some(RiskLevel::Impossible));
    assert_eq!(level("mc-reg"), Some(RiskLevel::Tight));
    assert_eq!(level("nu-ea"), Some(RiskLevel::Safe));
    // excluded, not unknown
    assert_eq!(level("nu-old"), None);
    assert_eq!(level("ucl-rd"), None);
    assert!(out.report.get("nope").is_err());

    // ps has 8h left and gates both at-risk deadlines
    let nu_int = out.report.get("nu-int").unwrap().unwrap();
    assert_eq!(nu_int.hours_needed, 12.5);
    assert_eq!(out.bottlenecks[0].task_id, "ps");

    let why = out.resolution.get("nu-why").unwrap();
    assert!(!why.actionable);
    assert_eq!(why.display_status, TaskStatus::Blocked);

    // stored as blocked, but nothing blocks it
    let tr = out.resolution.get("mc-tr").unwrap();
    assert!(tr.actionable);
    assert_eq!(tr.display_status, TaskStatus::NotStarted);
    assert_eq!(tr.stored_status, TaskStatus::Blocked);
}

#[test]
fn csv_and_json_snapshots_agree() {
    let from_csv = load_snapshot_dir(fixture_dir(), "maya").unwrap();
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("maya.json");
    save_json(&path, &from_csv).unwrap();

    let from_json = load_snapshot_json(&path).unwrap();
    assert_eq!(from_json, from_csv);
    assert_eq!(load_snapshot(&path, "ignored").unwrap().user_id, "maya");
}
