//! Tunable thresholds. Values are policy, not identity: callers may change them,
//! but `validate` keeps the severity ordering intact.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Risk classification thresholds (hours).
///
/// `critical_threshold = max(critical_floor_hours, critical_fraction * hours_needed)`
/// - buffer < 0                                   → impossible
/// - buffer < critical_threshold                  → critical
/// - buffer < tight_multiplier * critical_threshold → tight
/// - otherwise                                    → safe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskPolicy {
    pub critical_floor_hours: f64,
    pub critical_fraction: f64,
    pub tight_multiplier: f64,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            critical_floor_hours: 4.0,
            critical_fraction: 0.10,
            tight_multiplier: 3.0,
        }
    }
}

impl RiskPolicy {
    pub fn critical_threshold(&self, hours_needed: f64) -> f64 {
        self.critical_floor_hours
            .max(self.critical_fraction * hours_needed)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.critical_floor_hours.is_finite() && self.critical_floor_hours >= 0.0) {
            return Err(EngineError::InvalidPolicy(format!(
                "critical_floor_hours must be >= 0, got {}",
                self.critical_floor_hours
            )));
        }
        if !(self.critical_fraction.is_finite() && self.critical_fraction >= 0.0) {
            return Err(EngineError::InvalidPolicy(format!(
                "critical_fraction must be >= 0, got {}",
                self.critical_fraction
            )));
        }
        if !(self.tight_multiplier.is_finite() && self.tight_multiplier >= 1.0) {
            return Err(EngineError::InvalidPolicy(format!(
                "tight_multiplier must be >= 1, got {}",
                self.tight_multiplier
            )));
        }
        Ok(())
    }
}

/// Severity weights for bottleneck coverage, plus how many findings to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BottleneckPolicy {
    pub top_n: usize,
    pub weight_tight: u32,
    pub weight_critical: u32,
    pub weight_impossible: u32,
}

impl Default for BottleneckPolicy {
    fn default() -> Self {
        Self {
            top_n: 5,
            weight_tight: 1,
            weight_critical: 2,
            weight_impossible: 3,
        }
    }
}

impl BottleneckPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.weight_tight == 0
            || self.weight_critical <= self.weight_tight
            || self.weight_impossible <= self.weight_critical
        {
            return Err(EngineError::InvalidPolicy(format!(
                "weights must satisfy 0 < tight < critical < impossible, got {}/{}/{}",
                self.weight_tight, self.weight_critical, self.weight_impossible
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandCenterPolicy {
    /// Max entries in today's priorities.
    pub priorities_limit: usize,
}

impl Default for CommandCenterPolicy {
    fn default() -> Self {
        Self { priorities_limit: 8 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub risk: RiskPolicy,
    pub bottleneck: BottleneckPolicy,
    pub command_center: CommandCenterPolicy,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        self.risk.validate()?;
        self.bottleneck.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn critical_threshold_scales_with_workload() {
        let p = RiskPolicy::default();
        assert_eq!(p.critical_threshold(10.0), 4.0);
        assert_eq!(p.critical_threshold(100.0), 10.0);
    }

    #[test]
    fn unordered_weights_are_rejected() {
        let p = BottleneckPolicy {
            weight_critical: 5,
            weight_impossible: 4,
            ..BottleneckPolicy::default()
        };
        assert!(matches!(p.validate(), Err(EngineError::InvalidPolicy(_))));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{"risk": {"critical_floor_hours": 8.0}}"#).unwrap();
        assert_eq!(cfg.risk.critical_floor_hours, 8.0);
        assert_eq!(cfg.risk.tight_multiplier, 3.0);
        assert_eq!(cfg.bottleneck.top_n, 5);
    }
}
