//! BottleneckDetector: which unfinished task gates the most at-risk deadlines.
//!
//! Greedy weighted-coverage ranking over the at-risk assessments:
//! - coverage(task) = sum of severity weights over distinct at-risk deadlines whose
//!   gating set contains the task
//! - rank: coverage DESC, nearest gated deadline ASC, task id ASC
//!
//! Only ordered maps are used, so identical input yields an identical ranking.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::policy::BottleneckPolicy;
use crate::resolver::Resolution;
use crate::risk::{RiskLevel, RiskReport};
use crate::task::{Task, TaskType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bottleneck {
    /// 1-based position in the ranking.
    pub rank: usize,
    pub task_id: String,
    pub task_title: String,
    pub task_type: TaskType,
    pub weighted_coverage: u32,
    pub deadline_ids: Vec<String>,
    pub colleges: Vec<String>,
    pub worst_level: RiskLevel,
    pub nearest_deadline: DateTime<Utc>,
    pub remaining_hours: f64,
    pub actionable: bool,
    /// Open blockers that have to go first when the task is not actionable.
    pub blocked_by: Vec<String>,
    /// Dependents that become actionable once this task settles.
    pub unblocks: Vec<String>,
    pub suggestion: String,
}

impl Bottleneck {
    pub fn deadline_count(&self) -> usize {
        self.deadline_ids.len()
    }
}

#[derive(Debug, Default)]
struct Coverage<'a> {
    weight: u32,
    deadlines: BTreeSet<&'a str>,
    colleges: BTreeSet<&'a str>,
    worst: Option<RiskLevel>,
    nearest: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BottleneckDetector {
    policy: BottleneckPolicy,
}

impl BottleneckDetector {
    pub fn new(policy: BottleneckPolicy) -> Self {
        Self { policy }
    }

    pub fn weight(&self, level: RiskLevel) -> u32 {
        match level {
            RiskLevel::Safe => 0,
            RiskLevel::Tight => self.policy.weight_tight,
            RiskLevel::Critical => self.policy.weight_critical,
            RiskLevel::Impossible => self.policy.weight_impossible,
        }
    }

    /// Top-N bottlenecks.
    pub fn detect(
        &self,
        report: &RiskReport,
        tasks: &[Task],
        resolution: &Resolution,
    ) -> Vec<Bottleneck> {
        let mut ranked = self.rank_all(report, tasks, resolution);
        ranked.truncate(self.policy.top_n);
        ranked
    }

    /// Every open task that gates at least one at-risk deadline, ranked.
    pub fn rank_all(
        &self,
        report: &RiskReport,
        tasks: &[Task],
        resolution: &Resolution,
    ) -> Vec<Bottleneck> {
        let by_id: BTreeMap<&str, &Task> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();
        let mut coverage: BTreeMap<&str, Coverage> = BTreeMap::new();

        for a in report.at_risk() {
            let w = self.weight(a.level);
            for task_id in &a.task_ids {
                let c = coverage.entry(task_id.as_str()).or_default();
                if !c.deadlines.insert(a.deadline_id.as_str()) {
                    continue;
                }
                c.weight = c.weight.saturating_add(w);
                c.colleges.insert(a.college_name.as_str());
                c.worst = c.worst.max(Some(a.level));
                c.nearest = Some(match c.nearest {
                    Some(n) => n.min(a.deadline_date),
                    None => a.deadline_date,
                });
            }
        }

        let mut entries: Vec<(&str, Coverage)> = coverage.into_iter().collect();
        entries.sort_by(|(a_id, a), (b_id, b)| {
            b.weight
                .cmp(&a.weight)
                .then_with(|| a.nearest.cmp(&b.nearest))
                .then_with(|| a_id.cmp(b_id))
        });

        let mut out = Vec::with_capacity(entries.len());
        for (task_id, c) in entries {
            let Some(task) = by_id.get(task_id) else { continue };
            let (Some(worst_level), Some(nearest_deadline)) = (c.worst, c.nearest) else {
                continue;
            };

            let (actionable, blocked_by) = match resolution.get(task_id) {
                Ok(r) => (r.actionable, r.open_blockers.clone()),
                Err(_) => (true, Vec::new()),
            };
            let unblocks: Vec<String> = resolution
                .unblocked_by(task_id)
                .map(|ids| ids.into_iter().map(str::to_string).collect())
                .unwrap_or_default();

            let deadline_ids: Vec<String> = c.deadlines.iter().map(|s| s.to_string()).collect();
            let colleges: Vec<String> = c.colleges.iter().map(|s| s.to_string()).collect();
            let suggestion = suggestion(deadline_ids.len(), &colleges, &blocked_by, unblocks.len());

            out.push(Bottleneck {
                rank: out.len() + 1,
                task_id: task.id.clone(),
                task_title: task.display_name().to_string(),
                task_type: task.task_type,
                weighted_coverage: c.weight,
                deadline_ids,
                colleges,
                worst_level,
                nearest_deadline,
                remaining_hours: task.remaining_hours(),
                actionable,
                blocked_by,
                unblocks,
                suggestion,
            });
        }

        debug!(candidates = out.len(), "bottlenecks ranked");
        out
    }
}

fn suggestion(deadlines: usize, colleges: &[String], blocked_by: &[String], unblocks: usize) -> String {
    let mut s = format!(
        "Completing this unblocks {} at-risk deadline{}",
        deadlines,
        if deadlines == 1 { "" } else { "s" }
    );
    if !colleges.is_empty() {
        s.push_str(&format!(" ({})", colleges.join(", ")));
    }
    if unblocks > 0 {
        s.push_str(&format!(
            " and frees {} dependent task{}",
            unblocks,
            if unblocks == 1 { "" } else { "s" }
        ));
    }
    if !blocked_by.is_empty() {
        s.push_str(&format!("; finish {} first", blocked_by.join(", ")));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deadline::{Application, Deadline, DeadlineType};
    use crate::graph::TaskGraphBuilder;
    use crate::resolver::DependencyResolver;
    use crate::risk::DeadlineRiskAnalyzer;
    use crate::snapshot::Snapshot;
    use crate::task::BlockingEdge;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap()
    }

    /// Four applications, each with a deadline 10h out and its own 8h supplement.
    /// `ps` (shared, 1h) is needed by a1..a3, `cv` (shared, 1h) only by a4.
    fn portfolio() -> Snapshot {
        let mut s = Snapshot::new("u1");
        s.tasks.push(Task::new("ps", "u1", TaskType::Essay).shared().with_estimate(1.0));
        s.tasks.push(Task::new("cv", "u1", TaskType::Portfolio).shared().with_estimate(1.0));
        for (i, shared) in [(1, "ps"), (2, "ps"), (3, "ps"), (4, "cv")] {
            s.applications.push(
                Application::new(format!("a{i}"), format!("c{i}"), format!("College {i}"), "US")
                    .with_shared_task(shared),
            );
            s.tasks.push(
                Task::new(format!("supp{i}"), "u1", TaskType::Essay)
                    .for_application(format!("a{i}"))
                    .with_estimate(8.0),
            );
            s.deadlines.push(Deadline::new(
                format!("d{i}"),
                format!("a{i}"),
                DeadlineType::Regular,
                now() + Duration::hours(10),
            ));
        }
        s
    }

    fn run(s: &Snapshot) -> Vec<Bottleneck> {
        let g = TaskGraphBuilder::build(&s.tasks, &s.edges).unwrap();
        let r = DependencyResolver::resolve(&g, &s.tasks).unwrap();
        let report = DeadlineRiskAnalyzer::default().analyze(s, &g, now()).unwrap();
        BottleneckDetector::default().rank_all(&report, &s.tasks, &r)
    }

    #[test]
    fn task_gating_three_deadlines_outranks_one_gating_one() {
        let ranked = run(&portfolio());
        assert_eq!(ranked[0].task_id, "ps");
        assert_eq!(ranked[0].deadline_count(), 3);
        assert!(ranked[0].suggestion.starts_with("Completing this unblocks 3 at-risk deadlines"));

        let ps = ranked.iter().position(|b| b.task_id == "ps").unwrap();
        let cv = ranked.iter().position(|b| b.task_id == "cv").unwrap();
        assert!(ps < cv);
    }

    #[test]
    fn huge_weights_saturate_instead_of_overflowing() {
        let s = portfolio();
        let g = TaskGraphBuilder::build(&s.tasks, &s.edges).unwrap();
        let r = DependencyResolver::resolve(&g, &s.tasks).unwrap();
        let report = DeadlineRiskAnalyzer::default().analyze(&s, &g, now()).unwrap();

        let policy = BottleneckPolicy {
            weight_tight: 1,
            weight_critical: 3_000_000_000,
            weight_impossible: u32::MAX,
            ..BottleneckPolicy::default()
        };
        assert!(policy.validate().is_ok());

        let ranked = BottleneckDetector::new(policy).rank_all(&report, &s.tasks, &r);
        assert_eq!(ranked[0].task_id, "ps");
        assert_eq!(ranked[0].weighted_coverage, u32::MAX);
        let cv = ranked.iter().find(|b| b.task_id == "cv").unwrap();
        assert_eq!(cv.weighted_coverage, 3_000_000_000);
    }

    #[test]
    fn ranking_is_deterministic() {
        let s = portfolio();
        let first = run(&s);
        for _ in 0..5 {
            assert_eq!(run(&s), first);
        }
        let ranks: Vec<usize> = first.iter().map(|b| b.rank).collect();
        assert_eq!(ranks, (1..=first.len()).collect::<Vec<_>>());
    }

    #[test]
    fn ties_break_on_nearest_deadline_then_id() {
        let mut s = portfolio();
        // pull d4 closer: cv and supp4 now gate the nearest deadline
        s.deadlines[3].deadline_date = now() + Duration::hours(9);
        let ranked = run(&s);
        let order: Vec<&str> = ranked.iter().map(|b| b.task_id.as_str()).collect();
        assert_eq!(order, vec!["ps", "cv", "supp4", "supp1", "supp2", "supp3"]);
    }

    #[test]
    fn blocked_bottleneck_points_at_its_blocker() {
        let mut s = portfolio();
        s.tasks.push(Task::new("scores", "u1", TaskType::Test).shared().with_estimate(0.5));
        s.edges.push(BlockingEdge::new("ps", "scores"));
        let ranked = run(&s);
        let ps = ranked.iter().find(|b| b.task_id == "ps").unwrap();
        assert!(!ps.actionable);
        assert_eq!(ps.blocked_by, vec!["scores".to_string()]);
        assert!(ps.suggestion.ends_with("finish scores first"));
    }

    #[test]
    fn safe_deadlines_do_not_create_bottlenecks() {
        let mut s = portfolio();
        for d in &mut s.deadlines {
            d.deadline_date = now() + Duration::days(30);
        }
        assert!(run(&s).is_empty());
    }
}
