//! Risk module: stop prices, reward/risk, position size, stop vetoes.
//!
//! Pure functions of already-computed values. [`assess_risk`] bundles them
//! for the engine and raises the two stop vetoes that cannot be disabled.

pub mod reward;
pub mod sizing;
pub mod stops;

pub use reward::reward_risk;
pub use sizing::{position_size, PositionSize};
pub use stops::{protective_stop, trailing_stop, user_stop};

use serde::{Deserialize, Serialize};

use crate::config::PositionContext;
use crate::report::{Evidence, Source, Veto, VetoKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Give-back from the high-water mark that triggers the trailing stop.
    pub trailing_fraction: f64,
    /// Floor on the risk distance.
    pub risk_epsilon: f64,
    /// ATR multiple used as reward once price is at its swing high.
    pub reward_atr_multiple: f64,
    /// ATR multiple used as the per-share risk when sizing.
    pub sizing_atr_multiple: f64,
    /// Reward/risk below which a non-bullish setup is flagged.
    pub poor_reward_risk: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            trailing_fraction: 0.10,
            risk_epsilon: 0.01,
            reward_atr_multiple: 2.0,
            sizing_atr_multiple: 2.0,
            poor_reward_risk: 1.5,
        }
    }
}

/// Market values the risk module reads for the latest bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskInputs {
    pub close: f64,
    pub protective_stop: f64,
    pub atr: f64,
    pub swing_high: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskOutcome {
    pub user_stop: Option<f64>,
    pub trailing_stop: Option<f64>,
    pub reward_risk: f64,
    pub position_size: Option<PositionSize>,
    pub vetoes: Vec<Veto>,
    pub evidence: Evidence,
}

pub fn assess_risk(
    inputs: &RiskInputs,
    position: &PositionContext,
    config: &RiskConfig,
) -> RiskOutcome {
    let mut evidence = Evidence::new();
    let mut vetoes = Vec::new();
    let close = inputs.close;

    let user_stop = user_stop(position.entry_price, position.tolerated_loss);
    if let Some(stop) = user_stop.filter(|s| close <= *s) {
        let reason = format!("close {close:.2} at or below the loss limit {stop:.2}");
        evidence.push(Source::Risk, "Loss limit hit", reason.clone());
        vetoes.push(Veto::new(VetoKind::UserStop, reason));
    }

    let trailing = if position.trailing_stop {
        trailing_stop(
            position.entry_price,
            close,
            inputs.swing_high.unwrap_or(f64::NAN),
            config.trailing_fraction,
        )
    } else {
        None
    };
    if let Some(stop) = trailing.filter(|s| close < *s) {
        let reason = format!(
            "close {close:.2} gave back more than {:.0}% from the high (stop {stop:.2})",
            config.trailing_fraction * 100.0
        );
        evidence.push(Source::Risk, "Trailing stop hit", reason.clone());
        vetoes.push(Veto::new(VetoKind::TrailingStop, reason));
    }

    let rr = reward_risk(
        close,
        inputs.protective_stop,
        inputs.swing_high,
        inputs.atr,
        config.reward_atr_multiple,
        config.risk_epsilon,
    );

    let size = position_size(
        position.risk_budget,
        inputs.atr,
        config.sizing_atr_multiple,
        position.lot_size,
        position.board_lot,
    );
    if let Some(size) = &size {
        evidence.push(
            Source::Risk,
            "Position size",
            format!(
                "risk budget {:.0} supports {} shares ({} lots of {})",
                position.risk_budget, size.shares, size.board_lots, size.board_lot
            ),
        );
    }

    RiskOutcome {
        user_stop,
        trailing_stop: trailing,
        reward_risk: rr,
        position_size: size,
        vetoes,
        evidence,
    }
}
