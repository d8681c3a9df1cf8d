//! apptrack-core: deadline feasibility and task-dependency engine for the
//! college application tracker.
//!
//! Pure and synchronous: every call takes an explicit `Snapshot` and returns
//! fresh derived data. No I/O, no shared state.

pub mod alerts;
pub mod bottleneck;
pub mod command_center;
pub mod deadline;
pub mod engine;
pub mod error;
pub mod graph;
pub mod policy;
pub mod resolver;
pub mod risk;
pub mod snapshot;
pub mod task;
pub mod time;

pub use alerts::{ALERT_THRESHOLD, RiskAlert, risk_escalations};
pub use bottleneck::{Bottleneck, BottleneckDetector};
pub use command_center::{
    ActionableTask, AtRiskCollege, CommandCenterAggregator, CommandCenterData, CountryProgress,
    InfeasibleDeadline, PriorityItem, Remediation, WorkloadSummary,
};
pub use deadline::{Application, Deadline, DeadlineType};
pub use engine::{Engine, Recomputation};
pub use error::EngineError;
pub use graph::{DependencyGraph, GraphNode, TaskGraphBuilder};
pub use policy::{BottleneckPolicy, CommandCenterPolicy, EngineConfig, RiskPolicy};
pub use resolver::{DependencyResolver, Resolution, ResolvedTask};
pub use risk::{DeadlineRiskAnalyzer, RiskAssessment, RiskLevel, RiskReport};
pub use snapshot::Snapshot;
pub use task::{BlockingEdge, Task, TaskStatus, TaskType};
pub use time::{hours_between, parse_local_deadline_to_utc};
