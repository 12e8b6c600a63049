//! Evaluation output: the score report and its evidence trail.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::classify::{Branch, Regime};
use crate::error::EngineError;
use crate::evaluators::SignalSource;
use crate::risk::PositionSize;
use crate::scoring::{Action, CompositePolicyKind, FundamentalDimension, SubScore};
use crate::seasonality::MonthlySeasonality;

/// Which stage produced an explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Classifier,
    Fundamental,
    Macro,
    ChipFlow,
    Technical,
    Composite,
    Risk,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Source::Classifier => "classifier",
            Source::Fundamental => "fundamental",
            Source::Macro => "macro",
            Source::ChipFlow => "chip-flow",
            Source::Technical => "technical",
            Source::Composite => "composite",
            Source::Risk => "risk",
        };
        f.write_str(label)
    }
}

/// One (title, rationale) finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub source: Source,
    pub title: String,
    pub rationale: String,
}

/// Append-only list of findings. Entries can be added, never edited or removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Evidence(Vec<Explanation>);

impl Evidence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source: Source, title: impl Into<String>, rationale: impl Into<String>) {
        self.0.push(Explanation {
            source,
            title: title.into(),
            rationale: rationale.into(),
        });
    }

    /// Move another stage's findings onto the end of this list.
    pub fn append(&mut self, other: Evidence) {
        self.0.extend(other.0);
    }

    pub fn entries(&self) -> &[Explanation] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Explanation> {
        self.0.iter()
    }

    pub fn from_source(&self, source: Source) -> impl Iterator<Item = &Explanation> {
        self.0.iter().filter(move |e| e.source == source)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VetoKind {
    MacroCatastrophic,
    InventoryVelocity,
    UserStop,
    TrailingStop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Veto {
    pub kind: VetoKind,
    pub reason: String,
}

impl Veto {
    pub fn new(kind: VetoKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

/// A recoverable data problem the evaluation worked around.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum DataIssue {
    StaleFundamentalData { age_days: i64, max_age_days: i64 },
    MissingFundamentalData,
    InconsistentReportOrdering { detail: String },
    MissingChipFlow { reason: String },
    MacroUnavailable,
}

impl std::fmt::Display for DataIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataIssue::StaleFundamentalData {
                age_days,
                max_age_days,
            } => write!(f, "financials are {age_days} days old (limit {max_age_days})"),
            DataIssue::MissingFundamentalData => write!(f, "no quarterly financials"),
            DataIssue::InconsistentReportOrdering { detail } => {
                write!(f, "quarterly reports rejected: {detail}")
            }
            DataIssue::MissingChipFlow { reason } => {
                write!(f, "institutional flow unavailable: {reason}")
            }
            DataIssue::MacroUnavailable => write!(f, "macro context unavailable"),
        }
    }
}

/// Latest indicator values for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplaySnapshot {
    pub vwap: Option<f64>,
    pub slope_pct: Option<f64>,
    pub position: Option<f64>,
    pub rsi: Option<f64>,
    pub stoch_k: Option<f64>,
    pub bias: Option<f64>,
    /// OBV above its moving average.
    pub obv_rising: Option<bool>,
}

/// The three normalised sub-scores the composite was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub technical: SubScore,
    pub chip_flow: SubScore,
    pub fundamental: FundamentalDimension,
    /// Technical multiplier in [0.1, 1].
    pub gate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub symbol: String,
    pub as_of: NaiveDate,
    pub close: f64,
    pub regime: Regime,
    pub branch: Branch,
    pub policy: CompositePolicyKind,
    pub score: f64,
    pub score_floor: f64,
    pub score_ceiling: f64,
    pub action: Action,
    pub veto: Option<Veto>,
    pub sub_scores: SubScores,
    pub chip_flow_source: SignalSource,
    pub macro_multiplier: f64,
    pub protective_stop: f64,
    pub user_stop: Option<f64>,
    pub trailing_stop: Option<f64>,
    pub reward_risk: f64,
    pub position_size: Option<PositionSize>,
    pub snapshot: DisplaySnapshot,
    pub data_issues: Vec<DataIssue>,
    pub explanations: Evidence,
    pub seasonality: Option<MonthlySeasonality>,
}

impl ScoreReport {
    pub fn is_vetoed(&self) -> bool {
        self.veto.is_some()
    }

    /// Score rescaled to [-1, 1] across the policy's range.
    pub fn normalized_score(&self) -> f64 {
        crate::scoring::normalize(self.score, self.score_floor, self.score_ceiling)
    }
}

/// Result of evaluating one security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Evaluation {
    Scored(Box<ScoreReport>),
    /// No report: the inputs cannot support a score.
    InsufficientData { symbol: String, reason: EngineError },
}

impl Evaluation {
    pub fn report(&self) -> Option<&ScoreReport> {
        match self {
            Evaluation::Scored(report) => Some(report),
            Evaluation::InsufficientData { .. } => None,
        }
    }

    pub fn into_report(self) -> Option<ScoreReport> {
        match self {
            Evaluation::Scored(report) => Some(*report),
            Evaluation::InsufficientData { .. } => None,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Evaluation::Scored(report) => &report.symbol,
            Evaluation::InsufficientData { symbol, .. } => symbol,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evidence_appends_in_order() {
        let mut a = Evidence::new();
        a.push(Source::Technical, "one", "first");
        let mut b = Evidence::new();
        b.push(Source::Risk, "two", "second");
        a.append(b);
        let titles: Vec<_> = a.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["one", "two"]);
        assert_eq!(a.from_source(Source::Risk).count(), 1);
    }

    #[test]
    fn evidence_serializes_as_list() {
        let mut e = Evidence::new();
        e.push(Source::Macro, "t", "r");
        let json = serde_json::to_value(&e).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["source"], "macro");
    }

    #[test]
    fn data_issue_display() {
        let issue = DataIssue::StaleFundamentalData {
            age_days: 200,
            max_age_days: 110,
        };
        assert_eq!(issue.to_string(), "financials are 200 days old (limit 110)");
    }
}
