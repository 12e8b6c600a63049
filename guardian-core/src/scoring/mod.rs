//! Composite scoring: bounded sub-scores, weighting policies, vetoes, actions.

pub mod composite;
pub mod policy;

pub use composite::{composite, CompositeInputs, CompositeOutcome};
pub use policy::{CompositeConfig, CompositePolicyKind, StaleDataPolicy, VetoRules, Weights};

use serde::{Deserialize, Serialize};

/// A bounded evaluator score.
///
/// `points` is kept in the evaluator's native scale and clamped to
/// `[floor, ceiling]`; [`SubScore::normalized`] maps it onto [-100, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScore {
    pub points: f64,
    pub floor: f64,
    pub ceiling: f64,
}

impl SubScore {
    pub fn new(points: f64, floor: f64, ceiling: f64) -> Self {
        debug_assert!(ceiling > floor);
        Self {
            points: points.clamp(floor, ceiling),
            floor,
            ceiling,
        }
    }

    /// Midpoint of the range.
    pub fn neutral(floor: f64, ceiling: f64) -> Self {
        Self::new((floor + ceiling) / 2.0, floor, ceiling)
    }

    pub fn normalized(&self) -> f64 {
        normalize(self.points, self.floor, self.ceiling) * 100.0
    }
}

/// Map `value` in `[floor, ceiling]` linearly onto [-1, 1].
pub fn normalize(value: f64, floor: f64, ceiling: f64) -> f64 {
    if ceiling <= floor {
        return 0.0;
    }
    ((value - floor) / (ceiling - floor) * 2.0 - 1.0).clamp(-1.0, 1.0)
}

/// Whether the fundamental dimension takes part in the weighted average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FundamentalDimension {
    Included(SubScore),
    /// Stale or missing data. `raw` is informational and never weighted.
    Excluded { raw: Option<SubScore> },
}

impl FundamentalDimension {
    pub fn included(&self) -> Option<&SubScore> {
        match self {
            FundamentalDimension::Included(s) => Some(s),
            FundamentalDimension::Excluded { .. } => None,
        }
    }
}

/// Inclusive score range of a composite policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub floor: f64,
    pub ceiling: f64,
}

impl ScoreRange {
    pub fn neutral(&self) -> f64 {
        (self.floor + self.ceiling) / 2.0
    }

    pub fn clamp(&self, score: f64) -> f64 {
        score.clamp(self.floor, self.ceiling)
    }
}

/// Discrete recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    StrongBuy,
    Buy,
    Hold,
    Reduce,
    Sell,
    /// Forced by a veto.
    Exit,
}

impl Action {
    /// Band a score already normalised to [-1, 1].
    pub fn from_normalized(x: f64) -> Self {
        if x >= 0.6 {
            Action::StrongBuy
        } else if x >= 0.2 {
            Action::Buy
        } else if x > -0.2 {
            Action::Hold
        } else if x > -0.6 {
            Action::Reduce
        } else {
            Action::Sell
        }
    }

    pub fn is_bullish(self) -> bool {
        matches!(self, Action::StrongBuy | Action::Buy)
    }

    pub fn is_bearish(self) -> bool {
        matches!(self, Action::Sell | Action::Exit)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Action::StrongBuy => "STRONG BUY",
            Action::Buy => "BUY",
            Action::Hold => "HOLD",
            Action::Reduce => "REDUCE",
            Action::Sell => "SELL",
            Action::Exit => "EXIT",
        };
        f.write_str(label)
    }
}
