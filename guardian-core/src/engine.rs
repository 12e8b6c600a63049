//! Evaluation pipeline.
//!
//! ```text
//! Start -> IndicatorsComputed -> BranchSelected -> SubScoresComputed
//!       -> VetoCheck -> {Vetoed | Weighted} -> ReportEmitted
//! ```
//! Any undefined required input ends the call early in `InsufficientData`.
//! The engine holds only configuration; every call is independent.

use tracing::{debug, warn};

use crate::classify::classify;
use crate::config::{ConfigError, EngineConfig, PositionContext};
use crate::domain::{
    BarSeries, ChipFlowStatus, FinancialSnapshot, MacroContext, QuarterlyReport, SecurityProfile,
};
use crate::error::EngineError;
use crate::evaluators::{
    evaluate_chip_flow, evaluate_fundamentals, evaluate_macro, evaluate_technical,
};
use crate::indicators::IndicatorFrame;
use crate::report::{
    DataIssue, DisplaySnapshot, Evaluation, Evidence, ScoreReport, Source, SubScores,
};
use crate::risk::{assess_risk, RiskInputs};
use crate::scoring::{composite, CompositeInputs};
use crate::seasonality::MonthlySeasonality;

/// Pipeline stage, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    IndicatorsComputed,
    BranchSelected,
    SubScoresComputed,
    VetoCheck,
    Vetoed,
    Weighted,
    ReportEmitted,
    InsufficientData,
}

/// Everything one evaluation reads. Only the bars are mandatory.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationInputs<'a> {
    pub series: &'a BarSeries,
    pub profile: &'a SecurityProfile,
    /// Quarterly reports, most-recent-first.
    pub financials: Option<&'a [QuarterlyReport]>,
    pub chip_flow: Option<&'a ChipFlowStatus>,
    pub macro_context: Option<&'a MacroContext>,
    pub position: &'a PositionContext,
}

#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Build from a configuration that has not been validated yet.
    pub fn try_new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn evaluate(&self, inputs: &EvaluationInputs<'_>) -> Evaluation {
        let symbol = inputs.series.symbol();
        debug!(symbol, stage = ?Stage::Start, bars = inputs.series.len());

        match self.run(inputs) {
            Ok(report) => {
                debug!(
                    symbol,
                    stage = ?Stage::ReportEmitted,
                    score = report.score,
                    action = %report.action
                );
                Evaluation::Scored(Box::new(report))
            }
            Err(reason) => {
                debug!(symbol, stage = ?Stage::InsufficientData, %reason);
                Evaluation::InsufficientData {
                    symbol: symbol.to_string(),
                    reason,
                }
            }
        }
    }

    fn run(&self, inputs: &EvaluationInputs<'_>) -> Result<ScoreReport, EngineError> {
        let cfg = &self.config;
        let series = inputs.series;
        let symbol = series.symbol();
        let position = inputs.position;

        let frame = IndicatorFrame::compute(series, &cfg.indicators)?;
        let snap = frame.latest().ok_or_else(|| undefined("indicator frame"))?;
        let (close, atr) = match (snap.close, snap.atr) {
            (Some(close), Some(atr)) => (close, atr),
            _ => return Err(undefined("close or ATR")),
        };
        let as_of = series.last().date;
        debug!(symbol, stage = ?Stage::IndicatorsComputed, close, atr);

        let mut evidence = Evidence::new();
        let mut issues = Vec::new();

        let classification = classify(symbol, inputs.profile, &cfg.classifier);
        let branch = position
            .branch_override
            .unwrap_or_else(|| classification.regime.branch());
        evidence.push(
            Source::Classifier,
            "Regime",
            match position.branch_override {
                Some(b) => format!("{:?}, {b} branch forced by caller", classification.regime),
                None => format!(
                    "{:?} ({:?}), {branch} branch",
                    classification.regime, classification.rule
                ),
            },
        );
        debug!(symbol, stage = ?Stage::BranchSelected, regime = ?classification.regime, %branch);

        let snapshot = match inputs.financials {
            None => {
                issues.push(DataIssue::MissingFundamentalData);
                None
            }
            Some(reports) => match FinancialSnapshot::from_reports(reports) {
                Ok(s) => Some(s),
                Err(EngineError::NotEnoughReports(n)) => {
                    warn!(symbol, reports = n, "not enough quarterly reports");
                    issues.push(DataIssue::MissingFundamentalData);
                    None
                }
                Err(e) => {
                    warn!(symbol, error = %e, "quarterly reports rejected");
                    issues.push(DataIssue::InconsistentReportOrdering {
                        detail: e.to_string(),
                    });
                    None
                }
            },
        };

        let fundamental = evaluate_fundamentals(snapshot.as_ref(), close, as_of, &cfg.fundamental);
        let macro_outcome = evaluate_macro(inputs.macro_context, &cfg.macro_overlay);
        let chip = evaluate_chip_flow(inputs.chip_flow, &snap, &cfg.chip_flow);
        let technical = evaluate_technical(&frame, branch, fundamental.turnaround, &cfg.technical)
            .ok_or_else(|| undefined("moving averages or protective stop"))?;

        issues.extend(fundamental.issue.clone());
        issues.extend(macro_outcome.issue.clone());
        issues.extend(chip.issue.clone());
        for issue in &issues {
            warn!(symbol, %issue, "degraded input");
        }
        debug!(
            symbol,
            stage = ?Stage::SubScoresComputed,
            technical = technical.score.points,
            gate = technical.gate,
            chip_flow = chip.score.points,
            turnaround = fundamental.turnaround,
        );

        let risk = assess_risk(
            &RiskInputs {
                close,
                protective_stop: technical.protective_stop,
                atr,
                swing_high: snap.swing_high,
            },
            position,
            &cfg.risk,
        );

        let vetoes: Vec<_> = macro_outcome
            .veto
            .iter()
            .chain(fundamental.veto.iter())
            .chain(risk.vetoes.iter())
            .cloned()
            .collect();
        debug!(symbol, stage = ?Stage::VetoCheck, raised = vetoes.len());

        let policy = cfg.composite.policy_for(branch);
        let outcome = composite(
            policy,
            &CompositeInputs {
                technical: technical.score,
                gate: technical.gate,
                chip_flow: chip.score,
                fundamental: &fundamental.dimension,
                macro_multiplier: macro_outcome.multiplier,
                vetoes: &vetoes,
            },
            &cfg.composite,
        );
        match &outcome.veto {
            Some(v) => debug!(symbol, stage = ?Stage::Vetoed, kind = ?v.kind),
            None => debug!(symbol, stage = ?Stage::Weighted, score = outcome.score),
        }

        evidence.append(fundamental.evidence);
        evidence.append(macro_outcome.evidence);
        evidence.append(chip.evidence);
        evidence.append(technical.evidence);
        evidence.append(risk.evidence);
        if risk.reward_risk < cfg.risk.poor_reward_risk && !outcome.action.is_bullish() {
            evidence.push(
                Source::Risk,
                "Poor reward/risk",
                format!(
                    "reward/risk {:.1} below {:.1}; not worth chasing",
                    risk.reward_risk, cfg.risk.poor_reward_risk
                ),
            );
        }
        evidence.append(outcome.evidence);

        let seasonality = if position.include_seasonality {
            MonthlySeasonality::compute(series.bars(), &cfg.seasonality)
        } else {
            None
        };

        Ok(ScoreReport {
            symbol: symbol.to_string(),
            as_of,
            close,
            regime: classification.regime,
            branch,
            policy,
            score: outcome.score,
            score_floor: outcome.range.floor,
            score_ceiling: outcome.range.ceiling,
            action: outcome.action,
            veto: outcome.veto,
            sub_scores: SubScores {
                technical: technical.score,
                chip_flow: chip.score,
                fundamental: fundamental.dimension,
                gate: technical.gate,
            },
            chip_flow_source: chip.source,
            macro_multiplier: macro_outcome.multiplier,
            protective_stop: technical.protective_stop,
            user_stop: risk.user_stop,
            trailing_stop: risk.trailing_stop,
            reward_risk: risk.reward_risk,
            position_size: risk.position_size,
            snapshot: DisplaySnapshot {
                vwap: snap.vwap,
                slope_pct: snap.slope_pct,
                position: snap.position,
                rsi: snap.rsi,
                stoch_k: snap.stoch_k,
                bias: snap.bias,
                obv_rising: snap.obv.zip(snap.obv_ma).map(|(o, m)| o > m),
            },
            data_issues: issues,
            explanations: evidence,
            seasonality,
        })
    }
}

fn undefined(what: &str) -> EngineError {
    EngineError::UndefinedLatest {
        what: what.to_string(),
    }
}
