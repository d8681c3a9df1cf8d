//! Engine: one recomputation pass over a user's snapshot.
//!
//! validate → graph → resolver → risk → bottlenecks → command center, in that
//! order, every time. Any failure aborts the pass; callers keep showing their
//! previous cached view until the data is fixed.

use chrono::{DateTime, Utc};
use tracing::{debug, info, info_span};

use crate::bottleneck::{Bottleneck, BottleneckDetector};
use crate::command_center::{CommandCenterAggregator, CommandCenterData};
use crate::error::Result;
use crate::graph::{DependencyGraph, TaskGraphBuilder};
use crate::policy::EngineConfig;
use crate::resolver::{DependencyResolver, Resolution};
use crate::risk::{DeadlineRiskAnalyzer, RiskLevel, RiskReport};
use crate::snapshot::Snapshot;

/// Everything one pass derives. Nothing here is authoritative state.
#[derive(Debug, Clone)]
pub struct Recomputation {
    pub graph: DependencyGraph,
    pub resolution: Resolution,
    pub report: RiskReport,
    pub bottlenecks: Vec<Bottleneck>,
    pub command_center: CommandCenterData,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn recompute(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> Result<Recomputation> {
        let span = info_span!("recompute", user_id = %snapshot.user_id);
        let _guard = span.enter();

        snapshot.validate()?;
        debug!(
            tasks = snapshot.tasks.len(),
            deadlines = snapshot.deadlines.len(),
            edges = snapshot.edges.len(),
            "snapshot validated"
        );

        let graph = TaskGraphBuilder::build(&snapshot.tasks, &snapshot.edges)?;
        let resolution = DependencyResolver::resolve(&graph, &snapshot.tasks)?;
        let report = DeadlineRiskAnalyzer::new(self.config.risk).analyze(snapshot, &graph, now)?;
        let bottlenecks =
            BottleneckDetector::new(self.config.bottleneck).detect(&report, &snapshot.tasks, &resolution);
        let command_center = CommandCenterAggregator::new(self.config.command_center).compose(
            snapshot,
            &resolution,
            &report,
            &bottlenecks,
            now,
        );

        info!(
            evaluated = report.len(),
            at_risk = report.at_risk().count(),
            impossible = report.iter().filter(|a| a.level == RiskLevel::Impossible).count(),
            bottlenecks = bottlenecks.len(),
            readiness = command_center.overall_readiness,
            "recomputation finished"
        );

        Ok(Recomputation {
            graph,
            resolution,
            report,
            bottlenecks,
            command_center,
        })
    }
}
