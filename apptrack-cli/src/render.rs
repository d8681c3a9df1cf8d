//! Plain-text rendering of engine output for the terminal.

use apptrack_core::{
    Bottleneck, CommandCenterData, PriorityItem, Recomputation, Remediation, RiskAlert,
    RiskAssessment, RiskLevel,
};
use chrono::{DateTime, Utc};
use std::fmt::Write;

fn when(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn badge(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Safe => "SAFE",
        RiskLevel::Tight => "TIGHT",
        RiskLevel::Critical => "CRITICAL",
        RiskLevel::Impossible => "IMPOSSIBLE",
    }
}

pub fn assessment_line(a: &RiskAssessment) -> String {
    format!(
        "[{:<10}] {} | due {} | need {:.1}h of {:.1}h | buffer {:+.1}h | tasks={}",
        badge(a.level),
        a.label(),
        when(a.deadline_date),
        a.hours_needed,
        a.hours_remaining,
        a.buffer_hours,
        a.tasks_count
    )
}

pub fn bottleneck_line(b: &Bottleneck) -> String {
    let mut line = format!(
        "{}. {} ({}) | weight={} | deadlines={} | {:.1}h left",
        b.rank,
        b.task_title,
        b.task_id,
        b.weighted_coverage,
        b.deadline_count(),
        b.remaining_hours
    );
    if !b.actionable {
        let _ = write!(line, " | blocked by {}", b.blocked_by.join(", "));
    }
    let _ = write!(line, "\n   {}", b.suggestion);
    line
}

pub fn priority_line(p: &PriorityItem) -> String {
    match p {
        PriorityItem::Deadline {
            label,
            level,
            buffer_hours,
            deadline_date,
            ..
        } => format!(
            "[{}] {} due {} (buffer {:+.1}h)",
            badge(*level),
            label,
            when(*deadline_date),
            buffer_hours
        ),
        PriorityItem::Task {
            title, suggestion, ..
        } => format!("[TASK] {}: {}", title, suggestion),
    }
}

pub fn alert_line(a: &RiskAlert) -> String {
    format!("[{}] {}\n   {}", badge(a.level), a.title, a.body)
}

fn remediation_text(r: &Remediation) -> String {
    match r {
        Remediation::DropTask { title, hours, .. } => format!("drop '{}' ({:.1}h)", title, hours),
        Remediation::MoveDate => "move the date".to_string(),
        Remediation::RequestExtension => "request an extension".to_string(),
    }
}

pub fn command_center(cc: &CommandCenterData) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Command center ({})\n", when(cc.generated_at));
    let _ = writeln!(out, "Overall readiness: {}%\n", cc.overall_readiness);

    let _ = writeln!(out, "## Today");
    if cc.today_priorities.is_empty() {
        let _ = writeln!(out, "Nothing at risk.");
    }
    for p in &cc.today_priorities {
        let _ = writeln!(out, "- {}", priority_line(p));
    }

    if !cc.bottlenecks.is_empty() {
        let _ = writeln!(out, "\n## Bottlenecks");
        for b in &cc.bottlenecks {
            let _ = writeln!(out, "{}", bottleneck_line(b));
        }
    }

    if !cc.at_risk_colleges.is_empty() {
        let _ = writeln!(out, "\n## Infeasible deadlines");
        for college in &cc.at_risk_colleges {
            let _ = writeln!(out, "{}", college.college_name);
            for d in &college.deadlines {
                let _ = writeln!(
                    out,
                    "  - {}: {:.1}h short, {}",
                    d.label,
                    d.shortfall_hours,
                    remediation_text(&d.remediation)
                );
            }
        }
    }

    let _ = writeln!(out, "\n## Progress by country");
    for c in &cc.progress_by_country {
        let _ = writeln!(
            out,
            "- {}: {:.1}% ({} of {} tasks, {} applications)",
            c.country, c.percent, c.tasks_complete, c.tasks_total, c.applications
        );
    }

    let w = &cc.workload;
    let _ = writeln!(
        out,
        "\n## Workload\n{:.1}h unique across {} open tasks ({:.1}h counted per deadline, {} shared)",
        w.unique_hours, w.open_tasks, w.per_deadline_hours, w.shared_tasks
    );

    let _ = writeln!(out, "\n## Ready to work on");
    for t in &cc.actionable_tasks {
        let _ = writeln!(
            out,
            "- P{} {} ({:.1}h left)",
            t.priority, t.title, t.remaining_hours
        );
    }
    out
}

/// Topological order, one task per line, with derived status and blockers.
pub fn graph(run: &Recomputation) -> String {
    let mut out = String::new();
    for id in run.graph.topological_order() {
        let Ok(task) = run.resolution.get(id) else {
            continue;
        };
        let flag = if task.settled {
            "done"
        } else if task.actionable {
            "ready"
        } else {
            "blocked"
        };
        let _ = write!(out, "{:<8} {} [{:?}]", flag, id, task.display_status);
        if !task.open_blockers.is_empty() {
            let _ = write!(out, " <- {}", task.open_blockers.join(", "));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use apptrack_core::DeadlineType;
    use chrono::TimeZone;

    #[test]
    fn test_assessment_line_shows_signed_buffer() {
        let a = RiskAssessment {
            deadline_id: "d1".into(),
            deadline_title: "Early Action".into(),
            deadline_type: DeadlineType::EarlyAction,
            deadline_date: Utc.with_ymd_and_hms(2026, 11, 1, 4, 59, 0).unwrap(),
            application_id: "a1".into(),
            college_id: "c1".into(),
            college_name: "Tufts".into(),
            level: RiskLevel::Impossible,
            buffer_hours: -2.0,
            hours_remaining: 8.0,
            hours_needed: 10.0,
            tasks_count: 1,
            task_ids: vec!["t1".into()],
        };
        let line = assessment_line(&a);
        assert!(line.starts_with("[IMPOSSIBLE]"));
        assert!(line.contains("Tufts: Early Action"));
        assert!(line.contains("buffer -2.0h"));
        assert!(line.contains("2026-11-01 04:59 UTC"));
    }
}
