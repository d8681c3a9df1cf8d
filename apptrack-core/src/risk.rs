//! DeadlineRiskAnalyzer: per-deadline feasibility.
//!
//! For every open deadline we collect its gating set (direct tasks plus the
//! unsettled work that transitively blocks them), total the remaining hours and
//! compare against the wall-clock hours left. Shared tasks count in full for
//! every deadline that needs them: the essay still has to be written before
//! *this* deadline regardless of who else reuses it.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::deadline::{Application, Deadline, DeadlineType};
use crate::error::{EngineError, Result};
use crate::graph::DependencyGraph;
use crate::policy::RiskPolicy;
use crate::snapshot::Snapshot;
use crate::task::Task;
use crate::time::hours_between;

/// Ordered by severity: `Safe < Tight < Critical < Impossible`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Safe,
    Tight,
    Critical,
    Impossible,
}

impl RiskLevel {
    pub fn classify(buffer_hours: f64, hours_needed: f64, policy: &RiskPolicy) -> Self {
        if buffer_hours < 0.0 {
            return RiskLevel::Impossible;
        }
        let critical = policy.critical_threshold(hours_needed);
        if buffer_hours < critical {
            RiskLevel::Critical
        } else if buffer_hours < policy.tight_multiplier * critical {
            RiskLevel::Tight
        } else {
            RiskLevel::Safe
        }
    }

    pub fn is_at_risk(self) -> bool {
        self != RiskLevel::Safe
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Tight => "tight",
            RiskLevel::Critical => "critical",
            RiskLevel::Impossible => "impossible",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub deadline_id: String,
    pub deadline_title: String,
    pub deadline_type: DeadlineType,
    pub deadline_date: DateTime<Utc>,
    pub application_id: String,
    pub college_id: String,
    pub college_name: String,
    pub level: RiskLevel,
    /// `hours_remaining - hours_needed`; negative means infeasible.
    pub buffer_hours: f64,
    pub hours_remaining: f64,
    pub hours_needed: f64,
    pub tasks_count: usize,
    /// Open tasks contributing to `hours_needed`, sorted.
    pub task_ids: Vec<String>,
}

impl RiskAssessment {
    pub fn label(&self) -> String {
        if self.deadline_title.is_empty() {
            format!("{} ({})", self.college_name, self.deadline_id)
        } else {
            format!("{}: {}", self.college_name, self.deadline_title)
        }
    }
}

/// Assessments keyed by deadline id. Deadlines that are completed, inactive or
/// belong to a withdrawn application have no entry; their ids are kept in
/// `excluded_deadline_ids` so a cached report still tells them apart from ids
/// that never existed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub assessments: BTreeMap<String, RiskAssessment>,
    #[serde(default)]
    excluded_deadline_ids: BTreeSet<String>,
}

impl RiskReport {
    /// Report over already-computed assessments and the ids of deadlines that
    /// were left out of risk computation.
    pub fn from_assessments<I, E>(assessments: I, excluded: E) -> Self
    where
        I: IntoIterator<Item = RiskAssessment>,
        E: IntoIterator<Item = String>,
    {
        let assessments: BTreeMap<String, RiskAssessment> = assessments
            .into_iter()
            .map(|a| (a.deadline_id.clone(), a))
            .collect();
        let excluded_deadline_ids = excluded
            .into_iter()
            .filter(|id| !assessments.contains_key(id))
            .collect();
        Self {
            assessments,
            excluded_deadline_ids,
        }
    }

    /// `Err(UnknownDeadline)` for ids the snapshot never had, `Ok(None)` for
    /// deadlines that were excluded from risk computation.
    pub fn get(&self, deadline_id: &str) -> Result<Option<&RiskAssessment>> {
        if let Some(a) = self.assessments.get(deadline_id) {
            return Ok(Some(a));
        }
        if self.excluded_deadline_ids.contains(deadline_id) {
            Ok(None)
        } else {
            Err(EngineError::UnknownDeadline {
                deadline_id: deadline_id.to_string(),
            })
        }
    }

    pub fn excluded_deadline_ids(&self) -> impl Iterator<Item = &str> {
        self.excluded_deadline_ids.iter().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RiskAssessment> {
        self.assessments.values()
    }

    pub fn at_risk(&self) -> impl Iterator<Item = &RiskAssessment> {
        self.assessments.values().filter(|a| a.level.is_at_risk())
    }

    pub fn len(&self) -> usize {
        self.assessments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assessments.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeadlineRiskAnalyzer {
    policy: RiskPolicy,
}

impl DeadlineRiskAnalyzer {
    pub fn new(policy: RiskPolicy) -> Self {
        Self { policy }
    }

    /// Assess one deadline against an already-collected task set.
    pub fn assess(
        &self,
        deadline: &Deadline,
        application: &Application,
        tasks: &[&Task],
        now: DateTime<Utc>,
    ) -> RiskAssessment {
        let mut task_ids = Vec::new();
        let mut hours_needed = 0.0;
        for t in tasks.iter().filter(|t| !t.is_settled()) {
            hours_needed += t.remaining_hours();
            task_ids.push(t.id.clone());
        }
        task_ids.sort();
        task_ids.dedup();

        let hours_remaining = hours_between(now, deadline.deadline_date);
        let buffer_hours = hours_remaining - hours_needed;
        let level = RiskLevel::classify(buffer_hours, hours_needed, &self.policy);

        RiskAssessment {
            deadline_id: deadline.id.clone(),
            deadline_title: deadline.title.clone(),
            deadline_type: deadline.deadline_type,
            deadline_date: deadline.deadline_date,
            application_id: application.id.clone(),
            college_id: application.college_id.clone(),
            college_name: application.college_name.clone(),
            level,
            buffer_hours,
            hours_remaining,
            hours_needed,
            tasks_count: task_ids.len(),
            task_ids,
        }
    }

    /// Assess every open deadline in the snapshot.
    pub fn analyze(
        &self,
        snapshot: &Snapshot,
        graph: &DependencyGraph,
        now: DateTime<Utc>,
    ) -> Result<RiskReport> {
        let by_id: BTreeMap<&str, &Task> =
            snapshot.tasks.iter().map(|t| (t.id.as_str(), t)).collect();
        let open = |id: &str| by_id.get(id).is_some_and(|t| !t.is_settled());

        let mut report = RiskReport::default();
        report.excluded_deadline_ids = snapshot.deadlines.iter().map(|d| d.id.clone()).collect();

        for deadline in snapshot.evaluated_deadlines() {
            let application = snapshot.application(&deadline.application_id).ok_or_else(|| {
                EngineError::UnknownApplication {
                    application_id: deadline.application_id.clone(),
                    context: format!("referenced by deadline '{}'", deadline.id),
                }
            })?;

            let direct = snapshot.direct_task_ids(deadline);
            let gating = graph.reachable_blockers(direct.iter().map(String::as_str), open)?;
            let tasks: Vec<&Task> = gating.iter().filter_map(|id| by_id.get(id).copied()).collect();

            let assessment = self.assess(deadline, application, &tasks, now);
            debug!(
                deadline_id = %assessment.deadline_id,
                level = assessment.level.as_str(),
                hours_needed = assessment.hours_needed,
                hours_remaining = assessment.hours_remaining,
                "deadline assessed"
            );
            if assessment.level == RiskLevel::Impossible {
                warn!(
                    deadline_id = %assessment.deadline_id,
                    college = %assessment.college_name,
                    shortfall_hours = -assessment.buffer_hours,
                    "deadline cannot be met with remaining work"
                );
            }
            report.excluded_deadline_ids.remove(&assessment.deadline_id);
            report
                .assessments
                .insert(assessment.deadline_id.clone(), assessment);
        }

        Ok(report)
    }
}
