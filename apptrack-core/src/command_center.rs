//! CommandCenterAggregator: the portfolio-wide dashboard view.
//!
//! No algorithm of its own: it merges the risk report, the bottleneck ranking
//! and the resolver output into the shapes the dashboard renders.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bottleneck::Bottleneck;
use crate::policy::CommandCenterPolicy;
use crate::resolver::Resolution;
use crate::risk::{RiskAssessment, RiskLevel, RiskReport};
use crate::snapshot::Snapshot;
use crate::task::{Task, TaskStatus};

/// Priority values at or above this are treated as non-essential.
const NON_ESSENTIAL_PRIORITY: u8 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriorityItem {
    Deadline {
        deadline_id: String,
        label: String,
        level: RiskLevel,
        buffer_hours: f64,
        deadline_date: DateTime<Utc>,
        tasks_count: usize,
    },
    Task {
        task_id: String,
        title: String,
        level: RiskLevel,
        deadlines_gated: usize,
        deadline_date: DateTime<Utc>,
        suggestion: String,
    },
}

impl PriorityItem {
    pub fn level(&self) -> RiskLevel {
        match self {
            PriorityItem::Deadline { level, .. } | PriorityItem::Task { level, .. } => *level,
        }
    }

    /// How many at-risk deadlines acting on this item moves.
    pub fn coverage(&self) -> usize {
        match self {
            PriorityItem::Deadline { .. } => 1,
            PriorityItem::Task { deadlines_gated, .. } => *deadlines_gated,
        }
    }

    pub fn deadline_date(&self) -> DateTime<Utc> {
        match self {
            PriorityItem::Deadline { deadline_date, .. }
            | PriorityItem::Task { deadline_date, .. } => *deadline_date,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            PriorityItem::Deadline { deadline_id, .. } => deadline_id,
            PriorityItem::Task { task_id, .. } => task_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Remediation {
    /// Skip a non-essential task large enough to close the shortfall.
    DropTask { task_id: String, title: String, hours: f64 },
    /// Self-imposed deadline: move it.
    MoveDate,
    RequestExtension,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfeasibleDeadline {
    pub deadline_id: String,
    pub label: String,
    pub shortfall_hours: f64,
    pub reason: String,
    pub remediation: Remediation,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtRiskCollege {
    pub college_id: String,
    pub college_name: String,
    pub deadlines: Vec<InfeasibleDeadline>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryProgress {
    pub country: String,
    pub applications: usize,
    pub tasks_total: usize,
    pub tasks_complete: usize,
    /// Mean task completion, 0-100, one decimal.
    pub percent: f64,
}

/// Portfolio-level workload: shared tasks counted once in `unique_hours`, once
/// per deadline in `per_deadline_hours`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkloadSummary {
    pub unique_hours: f64,
    pub per_deadline_hours: f64,
    pub open_tasks: usize,
    pub shared_tasks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionableTask {
    pub task_id: String,
    pub title: String,
    pub priority: u8,
    pub remaining_hours: f64,
    pub display_status: TaskStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandCenterData {
    pub generated_at: DateTime<Utc>,
    pub invalidation_key: Option<DateTime<Utc>>,
    /// Share of evaluated deadlines that are not impossible, 0-100.
    pub overall_readiness: u8,
    pub today_priorities: Vec<PriorityItem>,
    pub bottlenecks: Vec<Bottleneck>,
    pub at_risk_colleges: Vec<AtRiskCollege>,
    pub progress_by_country: Vec<CountryProgress>,
    pub workload: WorkloadSummary,
    pub actionable_tasks: Vec<ActionableTask>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CommandCenterAggregator {
    policy: CommandCenterPolicy,
}

impl CommandCenterAggregator {
    pub fn new(policy: CommandCenterPolicy) -> Self {
        Self { policy }
    }

    pub fn compose(
        &self,
        snapshot: &Snapshot,
        resolution: &Resolution,
        report: &RiskReport,
        bottlenecks: &[Bottleneck],
        now: DateTime<Utc>,
    ) -> CommandCenterData {
        let by_id: BTreeMap<&str, &Task> =
            snapshot.tasks.iter().map(|t| (t.id.as_str(), t)).collect();

        CommandCenterData {
            generated_at: now,
            invalidation_key: snapshot.invalidation_key(),
            overall_readiness: overall_readiness(report),
            today_priorities: self.today_priorities(report, bottlenecks),
            bottlenecks: bottlenecks.to_vec(),
            at_risk_colleges: at_risk_colleges(report, &by_id),
            progress_by_country: progress_by_country(snapshot),
            workload: workload(report, &by_id),
            actionable_tasks: actionable_tasks(resolution, &by_id),
        }
    }

    /// At-risk deadlines and bottleneck tasks, most urgent first.
    pub fn today_priorities(&self, report: &RiskReport, bottlenecks: &[Bottleneck]) -> Vec<PriorityItem> {
        let mut items: Vec<PriorityItem> = report
            .at_risk()
            .map(|a| PriorityItem::Deadline {
                deadline_id: a.deadline_id.clone(),
                label: a.label(),
                level: a.level,
                buffer_hours: a.buffer_hours,
                deadline_date: a.deadline_date,
                tasks_count: a.tasks_count,
            })
            .chain(bottlenecks.iter().map(|b| PriorityItem::Task {
                task_id: b.task_id.clone(),
                title: b.task_title.clone(),
                level: b.worst_level,
                deadlines_gated: b.deadline_count(),
                deadline_date: b.nearest_deadline,
                suggestion: b.suggestion.clone(),
            }))
            .collect();

        items.sort_by(|a, b| {
            b.level()
                .cmp(&a.level())
                .then_with(|| b.coverage().cmp(&a.coverage()))
                .then_with(|| a.deadline_date().cmp(&b.deadline_date()))
                .then_with(|| a.id().cmp(b.id()))
        });
        items.truncate(self.policy.priorities_limit);
        items
    }
}

pub fn overall_readiness(report: &RiskReport) -> u8 {
    if report.is_empty() {
        return 100;
    }
    let feasible = report
        .iter()
        .filter(|a| a.level != RiskLevel::Impossible)
        .count();
    ((feasible as f64 / report.len() as f64) * 100.0).round() as u8
}

fn at_risk_colleges(report: &RiskReport, by_id: &BTreeMap<&str, &Task>) -> Vec<AtRiskCollege> {
    let mut grouped: BTreeMap<&str, AtRiskCollege> = BTreeMap::new();

    for a in report.iter().filter(|a| a.level == RiskLevel::Impossible) {
        let shortfall_hours = -a.buffer_hours;
        let remediation = remediation(a, shortfall_hours, by_id);
        let suggestion = match &remediation {
            Remediation::DropTask { title, hours, .. } => {
                format!("Drop a non-essential task: skipping '{title}' frees {hours:.1}h")
            }
            Remediation::MoveDate => "Move this self-imposed deadline later".to_string(),
            Remediation::RequestExtension => "Request an extension from the college".to_string(),
        };

        grouped
            .entry(a.college_id.as_str())
            .or_insert_with(|| AtRiskCollege {
                college_id: a.college_id.clone(),
                college_name: a.college_name.clone(),
                deadlines: Vec::new(),
            })
            .deadlines
            .push(InfeasibleDeadline {
                deadline_id: a.deadline_id.clone(),
                label: a.label(),
                shortfall_hours,
                reason: format!(
                    "{:.1}h of work remain but only {:.1}h until the deadline",
                    a.hours_needed,
                    a.hours_remaining.max(0.0)
                ),
                remediation,
                suggestion,
            });
    }

    grouped.into_values().collect()
}

fn remediation(a: &RiskAssessment, shortfall_hours: f64, by_id: &BTreeMap<&str, &Task>) -> Remediation {
    let droppable = a
        .task_ids
        .iter()
        .filter_map(|id| by_id.get(id.as_str()).copied())
        .filter(|t| t.priority >= NON_ESSENTIAL_PRIORITY && t.remaining_hours() >= shortfall_hours)
        .min_by(|x, y| {
            y.priority
                .cmp(&x.priority)
                .then_with(|| x.remaining_hours().total_cmp(&y.remaining_hours()))
                .then_with(|| x.id.cmp(&y.id))
        });

    // Dropping work cannot help once the date itself has passed.
    if a.hours_remaining > 0.0 {
        if let Some(t) = droppable {
            return Remediation::DropTask {
                task_id: t.id.clone(),
                title: t.display_name().to_string(),
                hours: t.remaining_hours(),
            };
        }
    }
    if a.deadline_type.is_self_imposed() {
        Remediation::MoveDate
    } else {
        Remediation::RequestExtension
    }
}

fn progress_by_country(snapshot: &Snapshot) -> Vec<CountryProgress> {
    #[derive(Default)]
    struct Acc<'a> {
        applications: usize,
        tasks: BTreeSet<&'a str>,
    }

    let mut by_country: BTreeMap<String, Acc> = BTreeMap::new();
    for app in snapshot.applications.iter().filter(|a| !a.withdrawn) {
        let country = if app.country.trim().is_empty() {
            "Unspecified".to_string()
        } else {
            app.country.trim().to_string()
        };
        let acc = by_country.entry(country).or_default();
        acc.applications += 1;
        acc.tasks.extend(
            snapshot
                .tasks
                .iter()
                .filter(|t| t.application_id.as_deref() == Some(app.id.as_str()))
                .map(|t| t.id.as_str()),
        );
        acc.tasks.extend(app.shared_task_ids.iter().map(String::as_str));
    }

    by_country
        .into_iter()
        .map(|(country, acc)| {
            let tasks: Vec<&Task> = acc
                .tasks
                .iter()
                .filter_map(|id| snapshot.task(id))
                .filter(|t| !t.retired)
                .collect();
            let tasks_complete = tasks.iter().filter(|t| t.is_settled()).count();
            let percent = if tasks.is_empty() {
                0.0
            } else {
                let sum: f64 = tasks.iter().map(|t| t.completion_percent()).sum();
                (sum / tasks.len() as f64 * 10.0).round() / 10.0
            };
            CountryProgress {
                country,
                applications: acc.applications,
                tasks_total: tasks.len(),
                tasks_complete,
                percent,
            }
        })
        .collect()
}

fn workload(report: &RiskReport, by_id: &BTreeMap<&str, &Task>) -> WorkloadSummary {
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    let mut per_deadline_hours = 0.0;
    for a in report.iter() {
        per_deadline_hours += a.hours_needed;
        for id in &a.task_ids {
            *seen.entry(id.as_str()).or_default() += 1;
        }
    }

    let unique_hours: f64 = seen
        .keys()
        .filter_map(|id| by_id.get(id))
        .map(|t| t.remaining_hours())
        .sum();

    WorkloadSummary {
        unique_hours,
        per_deadline_hours,
        open_tasks: seen.len(),
        shared_tasks: seen.values().filter(|&&n| n > 1).count(),
    }
}

fn actionable_tasks(resolution: &Resolution, by_id: &BTreeMap<&str, &Task>) -> Vec<ActionableTask> {
    let mut out: Vec<ActionableTask> = resolution
        .actionable_open()
        .filter_map(|r| {
            let t = by_id.get(r.task_id.as_str())?;
            Some(ActionableTask {
                task_id: t.id.clone(),
                title: t.display_name().to_string(),
                priority: t.priority,
                remaining_hours: t.remaining_hours(),
                display_status: r.display_status,
            })
        })
        .collect();
    out.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.task_id.cmp(&b.task_id)));
    out
}
