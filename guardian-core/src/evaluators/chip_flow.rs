//! Chip-flow evaluator: institutional net flow, or a volume/price proxy.

use serde::{Deserialize, Serialize};

use crate::domain::ChipFlowStatus;
use crate::indicators::IndicatorSnapshot;
use crate::report::{DataIssue, Evidence, Source};
use crate::scoring::SubScore;

pub const CHIP_FLOW_MAX: f64 = 3.0;

const BOTH_BUYING: f64 = 2.5;
const NET_BUYING: f64 = 2.0;
const NET_SELLING: f64 = -2.0;
const DISTRIBUTION: f64 = -2.0;
const ACCUMULATION: f64 = 1.5;
const OBV_TILT: f64 = 0.5;
const LOW_VOLATILITY_BONUS: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChipFlowConfig {
    /// Short/long average volume ratio above which volume is "rising".
    pub volume_surge_ratio: f64,
    /// Realised volatility (%) below which the low-volatility bonus applies.
    pub low_volatility_pct: f64,
}

impl Default for ChipFlowConfig {
    fn default() -> Self {
        Self {
            volume_surge_ratio: 1.2,
            low_volatility_pct: 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    InstitutionalFlow,
    VolumePriceProxy,
}

impl std::fmt::Display for SignalSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalSource::InstitutionalFlow => f.write_str("institutional flow"),
            SignalSource::VolumePriceProxy => f.write_str("volume/price proxy"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChipFlowOutcome {
    pub score: SubScore,
    pub source: SignalSource,
    pub issue: Option<DataIssue>,
    pub evidence: Evidence,
}

pub fn evaluate_chip_flow(
    flow: Option<&ChipFlowStatus>,
    snapshot: &IndicatorSnapshot,
    config: &ChipFlowConfig,
) -> ChipFlowOutcome {
    let mut evidence = Evidence::new();
    let mut total = 0.0;

    let (source, issue) = match flow.and_then(ChipFlowStatus::flow) {
        Some(flow) => {
            let net = flow.total_net();
            if flow.both_buying() {
                total += BOTH_BUYING;
                evidence.push(
                    Source::ChipFlow,
                    "Institutions buying",
                    format!(
                        "foreign {:+} and trusts {:+} both net buyers",
                        flow.foreign_net, flow.trust_net
                    ),
                );
            } else if net > 0 {
                total += NET_BUYING;
                evidence.push(
                    Source::ChipFlow,
                    "Net institutional buying",
                    format!("net {net:+} shares"),
                );
            } else if net < 0 {
                total += NET_SELLING;
                evidence.push(
                    Source::ChipFlow,
                    "Net institutional selling",
                    format!("net {net:+} shares"),
                );
            }
            (SignalSource::InstitutionalFlow, None)
        }
        None => {
            let reason = match flow {
                Some(ChipFlowStatus::Unavailable { reason }) => reason.clone(),
                _ => "not supplied".to_string(),
            };
            total += proxy_points(snapshot, config, &mut evidence);
            (
                SignalSource::VolumePriceProxy,
                Some(DataIssue::MissingChipFlow { reason }),
            )
        }
    };

    if let Some(vol) = snapshot.volatility.filter(|v| *v < config.low_volatility_pct) {
        total += LOW_VOLATILITY_BONUS;
        evidence.push(
            Source::ChipFlow,
            "Low volatility",
            format!("daily volatility {vol:.2}% below {:.1}%", config.low_volatility_pct),
        );
    }

    evidence.push(Source::ChipFlow, "Signal source", source.to_string());

    ChipFlowOutcome {
        score: SubScore::new(total, -CHIP_FLOW_MAX, CHIP_FLOW_MAX),
        source,
        issue,
        evidence,
    }
}

fn proxy_points(
    snapshot: &IndicatorSnapshot,
    config: &ChipFlowConfig,
    evidence: &mut Evidence,
) -> f64 {
    let mut points = 0.0;

    let ratio = match (snapshot.volume_short, snapshot.volume_long) {
        (Some(short), Some(long)) if long > 0.0 => Some(short / long),
        _ => None,
    };
    let rising = ratio.filter(|r| *r > config.volume_surge_ratio);
    if let (Some(ratio), Some(change)) = (rising, snapshot.change_pct) {
        if change < 0.0 {
            points += DISTRIBUTION;
            evidence.push(
                Source::ChipFlow,
                "Distribution",
                format!("volume x{ratio:.2} while price fell {change:.1}%"),
            );
        } else if change > 0.0 {
            points += ACCUMULATION;
            evidence.push(
                Source::ChipFlow,
                "Accumulation",
                format!("volume x{ratio:.2} with price up {change:.1}%"),
            );
        }
    }

    if let (Some(obv), Some(obv_ma)) = (snapshot.obv, snapshot.obv_ma) {
        if obv > obv_ma {
            points += OBV_TILT;
            evidence.push(Source::ChipFlow, "OBV inflow", "OBV above its average");
        } else if obv < obv_ma {
            points -= OBV_TILT;
            evidence.push(Source::ChipFlow, "OBV outflow", "OBV below its average");
        }
    }

    points
}
