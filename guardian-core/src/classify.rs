//! Regime classifier: picks the scoring branch from reference metadata.
//!
//! Pure and deterministic. Order of precedence:
//! 1. identifier on the cyclical override list
//! 2. cyclical keyword in sector / industry / summary text
//! 3. ETF marker in the short name
//! 4. `Unknown`

use serde::{Deserialize, Serialize};

use crate::domain::SecurityProfile;

/// Classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Regime {
    Trend,
    Cycle,
    Etf,
    Unknown,
}

impl Regime {
    /// `Unknown` and `Etf` are scored as trend followers.
    pub fn branch(self) -> Branch {
        match self {
            Regime::Cycle => Branch::Cycle,
            Regime::Trend | Regime::Etf | Regime::Unknown => Branch::Trend,
        }
    }
}

/// Scoring branch used by the technical evaluator and composite policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Branch {
    Trend,
    Cycle,
}

impl std::fmt::Display for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Branch::Trend => write!(f, "trend"),
            Branch::Cycle => write!(f, "cycle"),
        }
    }
}

impl std::str::FromStr for Branch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trend" => Ok(Branch::Trend),
            "cycle" | "cyclical" => Ok(Branch::Cycle),
            other => Err(format!("unknown branch '{other}' (expected trend or cycle)")),
        }
    }
}

/// Why a regime was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "matched", rename_all = "snake_case")]
pub enum MatchedRule {
    Override(String),
    Keyword(String),
    EtfMarker(String),
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub regime: Regime,
    pub rule: MatchedRule,
}

/// Lists the classifier matches against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub cycle_overrides: Vec<String>,
    pub cycle_keywords: Vec<String>,
    pub etf_markers: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            cycle_overrides: strings(&[
                "2603", "2609", "2615", "2618", "2408", "2344", "2337", "2002", "1301", "1303",
                "2409", "3481", "1101",
            ]),
            cycle_keywords: strings(&[
                "semiconductor",
                "memory",
                "dram",
                "marine",
                "shipping",
                "steel",
                "chemical",
                "panel",
            ]),
            etf_markers: strings(&["ETF", "Dividend"]),
        }
    }
}

/// Trim and strip exchange suffixes: `" 2330.TW "` -> `"2330"`.
pub fn normalize_identifier(identifier: &str) -> &str {
    let trimmed = identifier.trim();
    trimmed
        .strip_suffix(".TWO")
        .or_else(|| trimmed.strip_suffix(".TW"))
        .unwrap_or(trimmed)
}

pub fn classify(
    identifier: &str,
    profile: &SecurityProfile,
    config: &ClassifierConfig,
) -> Classification {
    let id = normalize_identifier(identifier);
    if let Some(hit) = config.cycle_overrides.iter().find(|o| o.as_str() == id) {
        return Classification {
            regime: Regime::Cycle,
            rule: MatchedRule::Override(hit.clone()),
        };
    }

    let text = profile.search_text();
    if let Some(kw) = config
        .cycle_keywords
        .iter()
        .find(|kw| !kw.is_empty() && text.contains(&kw.to_lowercase()))
    {
        return Classification {
            regime: Regime::Cycle,
            rule: MatchedRule::Keyword(kw.clone()),
        };
    }

    if let Some(marker) = config
        .etf_markers
        .iter()
        .find(|m| !m.is_empty() && profile.short_name.contains(m.as_str()))
    {
        return Classification {
            regime: Regime::Etf,
            rule: MatchedRule::EtfMarker(marker.clone()),
        };
    }

    Classification {
        regime: Regime::Unknown,
        rule: MatchedRule::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(short_name: &str, sector: &str, summary: &str) -> SecurityProfile {
        SecurityProfile {
            short_name: short_name.into(),
            sector: sector.into(),
            industry: String::new(),
            summary: summary.into(),
        }
    }

    #[test]
    fn override_list_wins_with_suffix() {
        let c = classify(" 2603.TW", &SecurityProfile::default(), &ClassifierConfig::default());
        assert_eq!(c.regime, Regime::Cycle);
        assert_eq!(c.rule, MatchedRule::Override("2603".into()));
    }

    #[test]
    fn otc_suffix_is_stripped() {
        assert_eq!(normalize_identifier("3481.TWO"), "3481");
        assert_eq!(normalize_identifier("AAPL"), "AAPL");
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let p = profile("Foo Corp", "Technology", "Designs DRAM modules");
        let c = classify("9999", &p, &ClassifierConfig::default());
        assert_eq!(c.regime, Regime::Cycle);
        assert_eq!(c.rule, MatchedRule::Keyword("dram".into()));
    }

    #[test]
    fn industry_text_is_searched() {
        let mut p = profile("Bar", "", "");
        p.industry = "Semiconductors".into();
        assert_eq!(classify("1", &p, &ClassifierConfig::default()).regime, Regime::Cycle);
    }

    #[test]
    fn etf_marker_in_short_name() {
        let p = profile("Yuanta High Dividend", "", "");
        let c = classify("0056", &p, &ClassifierConfig::default());
        assert_eq!(c.regime, Regime::Etf);
        assert_eq!(c.regime.branch(), Branch::Trend);
    }

    #[test]
    fn keywords_checked_before_etf_marker() {
        let p = profile("Semi ETF", "", "tracks semiconductor makers");
        assert_eq!(classify("00891", &p, &ClassifierConfig::default()).regime, Regime::Cycle);
    }

    #[test]
    fn unknown_maps_to_trend() {
        let c = classify("2330", &SecurityProfile::default(), &ClassifierConfig::default());
        assert_eq!(c.regime, Regime::Unknown);
        assert_eq!(c.regime.branch(), Branch::Trend);
    }

    #[test]
    fn deterministic() {
        let p = profile("X", "Industrials", "steel and shipping");
        let cfg = ClassifierConfig::default();
        assert_eq!(classify("1", &p, &cfg), classify("1", &p, &cfg));
    }

    #[test]
    fn branch_parses() {
        assert_eq!("Cycle".parse::<Branch>().unwrap(), Branch::Cycle);
        assert!("value".parse::<Branch>().is_err());
    }
}
