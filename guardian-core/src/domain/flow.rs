//! Institutional order flow.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Net buy (+) / sell (-) share quantities for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipFlow {
    pub date: NaiveDate,
    pub foreign_net: i64,
    pub trust_net: i64,
}

impl ChipFlow {
    pub fn total_net(&self) -> i64 {
        self.foreign_net.saturating_add(self.trust_net)
    }

    /// Both institutional categories are net buyers.
    pub fn both_buying(&self) -> bool {
        self.foreign_net > 0 && self.trust_net > 0
    }
}

/// Result of an institutional-flow lookup, with the reason when it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChipFlowStatus {
    Available(ChipFlow),
    Unavailable { reason: String },
}

impl ChipFlowStatus {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn flow(&self) -> Option<&ChipFlow> {
        match self {
            Self::Available(flow) => Some(flow),
            Self::Unavailable { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow(foreign_net: i64, trust_net: i64) -> ChipFlow {
        ChipFlow {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            foreign_net,
            trust_net,
        }
    }

    #[test]
    fn total_and_both_buying() {
        assert_eq!(flow(500, -200).total_net(), 300);
        assert!(!flow(500, -200).both_buying());
        assert!(flow(1, 1).both_buying());
    }

    #[test]
    fn total_saturates() {
        assert_eq!(flow(i64::MAX, 10).total_net(), i64::MAX);
    }

    #[test]
    fn status_accessor() {
        assert!(ChipFlowStatus::unavailable("holiday").flow().is_none());
        assert!(ChipFlowStatus::Available(flow(1, 2)).flow().is_some());
    }
}
