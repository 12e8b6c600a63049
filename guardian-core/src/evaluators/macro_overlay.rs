//! Macro overlay: volatility-index and market-regime multipliers, catastrophic veto.

use serde::{Deserialize, Serialize};

use crate::domain::{MacroContext, MarketRegime};
use crate::report::{DataIssue, Evidence, Source, Veto, VetoKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacroConfig {
    pub high_volatility: f64,
    pub high_volatility_multiplier: f64,
    pub catastrophic_volatility: f64,
    pub bear_multiplier: f64,
    /// Applied when no macro context could be obtained.
    pub unavailable_multiplier: f64,
}

impl Default for MacroConfig {
    fn default() -> Self {
        Self {
            high_volatility: 30.0,
            high_volatility_multiplier: 0.8,
            catastrophic_volatility: 45.0,
            bear_multiplier: 0.85,
            unavailable_multiplier: 0.9,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacroOutcome {
    /// Context actually used (the conservative default when none was given).
    pub context: MacroContext,
    /// Smallest applicable multiplier, 1.0 when none applies.
    pub multiplier: f64,
    pub veto: Option<Veto>,
    pub issue: Option<DataIssue>,
    pub evidence: Evidence,
}

pub fn evaluate_macro(context: Option<&MacroContext>, config: &MacroConfig) -> MacroOutcome {
    let mut evidence = Evidence::new();
    let mut multiplier: f64 = 1.0;
    let mut veto = None;

    let (context, issue) = match context {
        Some(ctx) => (ctx.clone(), None),
        None => {
            multiplier = multiplier.min(config.unavailable_multiplier);
            evidence.push(
                Source::Macro,
                "Macro unavailable",
                format!(
                    "assuming a correction; scores scaled x{:.2}",
                    config.unavailable_multiplier
                ),
            );
            (MacroContext::conservative(), Some(DataIssue::MacroUnavailable))
        }
    };

    if context.regime == MarketRegime::Bear {
        multiplier = multiplier.min(config.bear_multiplier);
        evidence.push(
            Source::Macro,
            "Bear market",
            format!("benchmark in a bear regime; scores scaled x{:.2}", config.bear_multiplier),
        );
    }

    if let Some(vix) = context.volatility_index {
        if vix > config.catastrophic_volatility {
            let reason = format!(
                "volatility index {vix:.1} above {:.0}",
                config.catastrophic_volatility
            );
            evidence.push(Source::Macro, "Market panic", reason.clone());
            veto = Some(Veto::new(VetoKind::MacroCatastrophic, reason));
        } else if vix > config.high_volatility {
            multiplier = multiplier.min(config.high_volatility_multiplier);
            evidence.push(
                Source::Macro,
                "High volatility",
                format!(
                    "volatility index {vix:.1} above {:.0}; scores scaled x{:.2}",
                    config.high_volatility, config.high_volatility_multiplier
                ),
            );
        }
    }

    MacroOutcome {
        context,
        multiplier,
        veto,
        issue,
        evidence,
    }
}
