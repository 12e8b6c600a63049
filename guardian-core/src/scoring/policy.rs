//! Weighting policy configuration.

use serde::{Deserialize, Serialize};

use super::ScoreRange;
use crate::classify::Branch;

/// How sub-scores combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositePolicyKind {
    /// Weighted mean of all three sub-scores, range [-100, 100].
    Weighted,
    /// Weighted mean mapped to [0, 100], times the technical gate.
    Gated,
}

impl CompositePolicyKind {
    pub fn range(self) -> ScoreRange {
        match self {
            CompositePolicyKind::Weighted => ScoreRange {
                floor: -100.0,
                ceiling: 100.0,
            },
            CompositePolicyKind::Gated => ScoreRange {
                floor: 0.0,
                ceiling: 100.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub technical: f64,
    pub chip_flow: f64,
    pub fundamental: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            technical: 0.4,
            chip_flow: 0.4,
            fundamental: 0.2,
        }
    }
}

/// Treatment of an excluded fundamental dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleDataPolicy {
    /// Drop its weight from the denominator.
    #[default]
    Renormalize,
    /// Count it as a neutral 0 at full weight.
    Neutral,
}

/// Switches for the vetoes that may be turned off. Stop vetoes always apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VetoRules {
    pub inventory_velocity: bool,
    pub macro_catastrophic: bool,
}

impl Default for VetoRules {
    fn default() -> Self {
        Self {
            inventory_velocity: true,
            macro_catastrophic: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeConfig {
    pub trend_policy: CompositePolicyKind,
    pub cycle_policy: CompositePolicyKind,
    pub weights: Weights,
    pub stale_data: StaleDataPolicy,
    pub vetoes: VetoRules,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            trend_policy: CompositePolicyKind::Weighted,
            cycle_policy: CompositePolicyKind::Gated,
            weights: Weights::default(),
            stale_data: StaleDataPolicy::default(),
            vetoes: VetoRules::default(),
        }
    }
}

impl CompositeConfig {
    pub fn policy_for(&self, branch: Branch) -> CompositePolicyKind {
        match branch {
            Branch::Trend => self.trend_policy,
            Branch::Cycle => self.cycle_policy,
        }
    }
}
