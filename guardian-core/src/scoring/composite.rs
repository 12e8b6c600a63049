//! Sub-score combination and veto override.

use super::{
    Action, CompositeConfig, CompositePolicyKind, FundamentalDimension, ScoreRange,
    StaleDataPolicy, SubScore,
};
use crate::report::{Evidence, Source, Veto, VetoKind};

#[derive(Debug, Clone)]
pub struct CompositeInputs<'a> {
    pub technical: SubScore,
    /// Technical multiplier in [0.1, 1], read by the gated policy only.
    pub gate: f64,
    pub chip_flow: SubScore,
    pub fundamental: &'a FundamentalDimension,
    /// Macro multiplier in (0, 1].
    pub macro_multiplier: f64,
    /// Every veto raised upstream, before `VetoRules` filtering.
    pub vetoes: &'a [Veto],
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeOutcome {
    pub policy: CompositePolicyKind,
    pub range: ScoreRange,
    pub score: f64,
    pub action: Action,
    /// The veto that decided the outcome, if any.
    pub veto: Option<Veto>,
    pub evidence: Evidence,
}

/// Weighted mean of `(value, weight)` pairs; `None` when no weight remains.
fn weighted_mean(parts: &[(f64, f64)]) -> Option<f64> {
    let den: f64 = parts.iter().map(|(_, w)| w).sum();
    if den <= 0.0 {
        return None;
    }
    Some(parts.iter().map(|(v, w)| v * w).sum::<f64>() / den)
}

fn fundamental_part(
    dimension: &FundamentalDimension,
    weight: f64,
    stale_data: StaleDataPolicy,
) -> Option<(f64, f64)> {
    match (dimension, stale_data) {
        (FundamentalDimension::Included(s), _) => Some((s.normalized(), weight)),
        (FundamentalDimension::Excluded { .. }, StaleDataPolicy::Neutral) => Some((0.0, weight)),
        (FundamentalDimension::Excluded { .. }, StaleDataPolicy::Renormalize) => None,
    }
}

fn veto_enabled(kind: VetoKind, config: &CompositeConfig) -> bool {
    match kind {
        VetoKind::InventoryVelocity => config.vetoes.inventory_velocity,
        VetoKind::MacroCatastrophic => config.vetoes.macro_catastrophic,
        VetoKind::UserStop | VetoKind::TrailingStop => true,
    }
}

/// Combine sub-scores under `policy`; any enabled veto forces the range floor.
pub fn composite(
    policy: CompositePolicyKind,
    inputs: &CompositeInputs<'_>,
    config: &CompositeConfig,
) -> CompositeOutcome {
    let range = policy.range();
    let weights = &config.weights;
    let mut evidence = Evidence::new();

    let fundamental = fundamental_part(inputs.fundamental, weights.fundamental, config.stale_data);
    if fundamental.is_none() {
        evidence.push(
            Source::Composite,
            "Fundamentals excluded",
            "weights re-normalised over technical and chip-flow",
        );
    }

    let score = match policy {
        CompositePolicyKind::Weighted => {
            let mut parts = vec![
                (inputs.technical.normalized(), weights.technical),
                (inputs.chip_flow.normalized(), weights.chip_flow),
            ];
            parts.extend(fundamental);
            let raw = weighted_mean(&parts).unwrap_or(0.0);
            if raw > 0.0 {
                raw * inputs.macro_multiplier
            } else {
                raw
            }
        }
        CompositePolicyKind::Gated => {
            let mut parts = vec![
                (inputs.technical.normalized(), weights.technical),
                (inputs.chip_flow.normalized(), weights.chip_flow),
            ];
            parts.extend(fundamental);
            let mean = weighted_mean(&parts).unwrap_or(0.0);
            let gated = (mean + 100.0) / 2.0 * inputs.gate.clamp(0.1, 1.0);
            let neutral = range.neutral();
            if gated > neutral {
                neutral + (gated - neutral) * inputs.macro_multiplier
            } else {
                gated
            }
        }
    };
    let score = range.clamp(score);

    let mut decisive = None;
    for veto in inputs.vetoes {
        if veto_enabled(veto.kind, config) {
            if decisive.is_none() {
                decisive = Some(veto.clone());
            }
        } else {
            evidence.push(
                Source::Composite,
                "Veto disabled",
                format!("{:?} ignored by configuration: {}", veto.kind, veto.reason),
            );
        }
    }

    match decisive {
        Some(veto) => {
            evidence.push(Source::Composite, "Hard veto", veto.reason.clone());
            CompositeOutcome {
                policy,
                range,
                score: range.floor,
                action: Action::Exit,
                veto: Some(veto),
                evidence,
            }
        }
        None => {
            let action = Action::from_normalized(super::normalize(score, range.floor, range.ceiling));
            CompositeOutcome {
                policy,
                range,
                score,
                action,
                veto: None,
                evidence,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tech(points: f64) -> SubScore {
        SubScore::new(points, -100.0, 100.0)
    }

    fn chip(points: f64) -> SubScore {
        SubScore::new(points, -3.0, 3.0)
    }

    fn fund(points: f64) -> FundamentalDimension {
        FundamentalDimension::Included(SubScore::new(points, 0.0, 4.0))
    }

    fn inputs<'a>(
        technical: f64,
        chip_flow: f64,
        fundamental: &'a FundamentalDimension,
        vetoes: &'a [Veto],
    ) -> CompositeInputs<'a> {
        CompositeInputs {
            technical: tech(technical),
            gate: 1.0,
            chip_flow: chip(chip_flow),
            fundamental,
            macro_multiplier: 1.0,
            vetoes,
        }
    }

    #[test]
    fn weighted_default_weights() {
        // technical 80, chip +1.5 => 50, fundamental 4 => 100
        let f = fund(4.0);
        let out = composite(
            CompositePolicyKind::Weighted,
            &inputs(80.0, 1.5, &f, &[]),
            &CompositeConfig::default(),
        );
        assert!((out.score - 72.0).abs() < 1e-9);
        assert_eq!(out.action, Action::StrongBuy);
    }

    #[test]
    fn neutral_inputs_hold() {
        let f = fund(2.0);
        let cfg = CompositeConfig::default();
        for policy in [CompositePolicyKind::Weighted, CompositePolicyKind::Gated] {
            let out = composite(policy, &inputs(0.0, 0.0, &f, &[]), &cfg);
            assert_eq!(out.action, Action::Hold, "{policy:?}");
            assert!((out.score - out.range.neutral()).abs() < 1e-9);
        }
    }

    #[test]
    fn excluded_fundamental_renormalises() {
        let excluded_zero = FundamentalDimension::Excluded {
            raw: Some(SubScore::new(0.0, 0.0, 4.0)),
        };
        let excluded_none = FundamentalDimension::Excluded { raw: None };
        let cfg = CompositeConfig::default();
        let a = composite(CompositePolicyKind::Weighted, &inputs(40.0, 3.0, &excluded_zero, &[]), &cfg);
        let b = composite(CompositePolicyKind::Weighted, &inputs(40.0, 3.0, &excluded_none, &[]), &cfg);
        assert_eq!(a.score, b.score);
        // (0.4*40 + 0.4*100) / 0.8
        assert!((a.score - 70.0).abs() < 1e-9);
    }

    #[test]
    fn neutral_stale_policy_keeps_weight() {
        let excluded = FundamentalDimension::Excluded { raw: None };
        let cfg = CompositeConfig {
            stale_data: StaleDataPolicy::Neutral,
            ..CompositeConfig::default()
        };
        let out = composite(CompositePolicyKind::Weighted, &inputs(40.0, 3.0, &excluded, &[]), &cfg);
        assert!((out.score - 56.0).abs() < 1e-9);
    }

    #[test]
    fn gated_multiplies_by_gate() {
        // mean (0.4*0 + 0.4*100 + 0.2*100) = 60 -> base 80 -> x0.4
        let f = fund(4.0);
        let mut inp = inputs(0.0, 3.0, &f, &[]);
        inp.gate = 0.4;
        let out = composite(CompositePolicyKind::Gated, &inp, &CompositeConfig::default());
        assert!((out.score - 32.0).abs() < 1e-9);
    }

    #[test]
    fn gated_reads_technical_points() {
        let f = fund(2.0);
        let cfg = CompositeConfig::default();
        let low = composite(CompositePolicyKind::Gated, &inputs(25.0, 0.0, &f, &[]), &cfg);
        let high = composite(CompositePolicyKind::Gated, &inputs(-60.0, 0.0, &f, &[]), &cfg);
        // mean 10 -> 55, mean -24 -> 38
        assert!((low.score - 55.0).abs() < 1e-9);
        assert!((high.score - 38.0).abs() < 1e-9);
        assert!(low.score > high.score);
        assert_eq!(high.action, Action::Reduce);
    }

    #[test]
    fn macro_multiplier_leaves_gated_midpoint() {
        let f = fund(2.0);
        let mut inp = inputs(0.0, 0.0, &f, &[]);
        inp.macro_multiplier = 0.8;
        let cfg = CompositeConfig::default();
        let neutral = composite(CompositePolicyKind::Gated, &inp, &cfg);
        assert_eq!(neutral.score, 50.0);
        assert_eq!(neutral.action, Action::Hold);

        let f = fund(4.0);
        let mut inp = inputs(100.0, 3.0, &f, &[]);
        inp.macro_multiplier = 0.8;
        let bullish = composite(CompositePolicyKind::Gated, &inp, &cfg);
        assert!((bullish.score - 90.0).abs() < 1e-9);
    }

    #[test]
    fn macro_multiplier_only_dampens_bullish_weighted() {
        let f = fund(0.0);
        let mut inp = inputs(-50.0, -3.0, &f, &[]);
        inp.macro_multiplier = 0.8;
        let out = composite(CompositePolicyKind::Weighted, &inp, &CompositeConfig::default());
        assert!((out.score - -80.0).abs() < 1e-9);
    }

    #[test]
    fn veto_forces_floor() {
        let f = fund(4.0);
        let vetoes = [Veto::new(VetoKind::UserStop, "close below stop")];
        for policy in [CompositePolicyKind::Weighted, CompositePolicyKind::Gated] {
            let out = composite(policy, &inputs(100.0, 3.0, &f, &vetoes), &CompositeConfig::default());
            assert_eq!(out.score, policy.range().floor);
            assert_eq!(out.action, Action::Exit);
        }
    }

    #[test]
    fn disabled_veto_is_recorded_not_applied() {
        let f = fund(2.0);
        let vetoes = [Veto::new(VetoKind::InventoryVelocity, "inventory build-up")];
        let mut cfg = CompositeConfig::default();
        cfg.vetoes.inventory_velocity = false;
        let out = composite(CompositePolicyKind::Weighted, &inputs(0.0, 0.0, &f, &vetoes), &cfg);
        assert!(out.veto.is_none());
        assert_eq!(out.evidence.from_source(Source::Composite).count(), 1);
    }

    #[test]
    fn stop_vetoes_cannot_be_disabled() {
        let f = fund(2.0);
        let vetoes = [Veto::new(VetoKind::TrailingStop, "gave back 10%")];
        let cfg = CompositeConfig {
            vetoes: crate::scoring::VetoRules {
                inventory_velocity: false,
                macro_catastrophic: false,
            },
            ..CompositeConfig::default()
        };
        let out = composite(CompositePolicyKind::Gated, &inputs(0.0, 0.0, &f, &vetoes), &cfg);
        assert_eq!(out.action, Action::Exit);
    }
}
