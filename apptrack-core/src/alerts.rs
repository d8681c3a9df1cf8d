//! Risk escalation projection for the notification layer.
//!
//! The engine keeps no "already alerted" state. It compares two reports and
//! hands back the deadlines that just crossed into critical or impossible;
//! delivery and de-duplication belong to the notification collaborator, keyed
//! on `dedupe_key`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::risk::{RiskLevel, RiskReport};

/// Lowest level that is worth interrupting the student for.
pub const ALERT_THRESHOLD: RiskLevel = RiskLevel::Critical;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAlert {
    pub deadline_id: String,
    pub college_name: String,
    pub deadline_date: DateTime<Utc>,
    /// `None` when the deadline was not assessed in the previous report.
    pub previous_level: Option<RiskLevel>,
    pub level: RiskLevel,
    pub buffer_hours: f64,
    pub title: String,
    pub body: String,
    /// Unique per deadline and level, so a later escalation from critical to
    /// impossible is a distinct alert.
    pub dedupe_key: String,
}

/// Deadlines at or above `ALERT_THRESHOLD` now that were below it (or absent)
/// in `previous`, plus critical → impossible escalations. Sorted by deadline date
/// then id.
pub fn risk_escalations(previous: &RiskReport, current: &RiskReport) -> Vec<RiskAlert> {
    let mut out: Vec<RiskAlert> = current
        .iter()
        .filter(|a| a.level >= ALERT_THRESHOLD)
        .filter_map(|a| {
            let before = previous.assessments.get(&a.deadline_id).map(|p| p.level);
            if before.is_some_and(|b| b >= a.level) {
                return None;
            }

            let title = match a.level {
                RiskLevel::Impossible => format!("{} can no longer be met", a.label()),
                _ => format!("{} is now critical", a.label()),
            };
            let body = if a.buffer_hours < 0.0 {
                format!(
                    "{:.1}h of work left but only {:.1}h until the deadline ({:.1}h short).",
                    a.hours_needed, a.hours_remaining, -a.buffer_hours
                )
            } else {
                format!(
                    "{:.1}h of work left with {:.1}h of slack before the deadline.",
                    a.hours_needed, a.buffer_hours
                )
            };

            Some(RiskAlert {
                deadline_id: a.deadline_id.clone(),
                college_name: a.college_name.clone(),
                deadline_date: a.deadline_date,
                previous_level: before,
                level: a.level,
                buffer_hours: a.buffer_hours,
                title,
                body,
                dedupe_key: format!("{}:{}", a.deadline_id, a.level.as_str()),
            })
        })
        .collect();

    out.sort_by(|x, y| {
        x.deadline_date
            .cmp(&y.deadline_date)
            .then_with(|| x.deadline_id.cmp(&y.deadline_id))
    });
    out
}
