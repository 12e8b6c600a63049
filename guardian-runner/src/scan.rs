//! Watchlist scanning.
//!
//! [`Scanner::scan`] returns a pull-based iterator: each `next()` fetches one
//! security through the provider and evaluates it, so a caller that stops
//! iterating stops fetching. The macro snapshot is fetched once per scan and
//! shared by every evaluation.
//!
//! Data problems never abort a scan. A security without bars, with too little
//! history, or whose source failed becomes a non-scored [`ScanOutcome`].

use crate::provider::{DataError, DataSource, MarketDataProvider};
use crate::watchlist::{WatchEntry, WatchGroup, Watchlist};
use guardian_core::classify::Branch;
use guardian_core::domain::{
    BarSeries, ChipFlowStatus, MacroContext, QuarterlyReport, SecurityProfile,
};
use guardian_core::scoring::Action;
use guardian_core::{
    Engine, EngineError, Evaluation, EvaluationInputs, PositionContext, ScoreReport,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Calendar days of history requested per security.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 730;

/// Everything fetched for one security before scoring.
#[derive(Debug, Clone)]
pub struct SecurityInputs {
    pub series: BarSeries,
    pub profile: SecurityProfile,
    pub financials: Option<Vec<QuarterlyReport>>,
    pub chip_flow: Option<ChipFlowStatus>,
    pub source: DataSource,
}

impl SecurityInputs {
    /// Fetch bars and the optional inputs for `ticker`.
    ///
    /// Only a failed bar fetch is an error. Failures of the optional lookups
    /// are logged and degrade to missing data. `hint` fills profile fields the
    /// provider leaves blank.
    pub fn fetch<P: MarketDataProvider + ?Sized>(
        provider: &P,
        ticker: &str,
        hint: &SecurityProfile,
        lookback_days: u32,
    ) -> Result<Option<Self>, DataError> {
        let Some(series) = provider.history(ticker, lookback_days)? else {
            return Ok(None);
        };

        let mut profile = match provider.profile(ticker) {
            Ok(p) => p.unwrap_or_default(),
            Err(e) => {
                warn!(ticker, error = %e, "profile lookup failed");
                SecurityProfile::default()
            }
        };
        fill_blanks(&mut profile, hint);

        let financials = provider.quarterly_statements(ticker).unwrap_or_else(|e| {
            warn!(ticker, error = %e, "financial statements lookup failed");
            None
        });

        let last = series.last().date;
        let chip_flow = match provider.institutional_flow(ticker, last) {
            Ok(flow) => flow,
            Err(e) => {
                warn!(ticker, error = %e, "institutional flow lookup failed");
                Some(ChipFlowStatus::unavailable(e.to_string()))
            }
        };

        Ok(Some(Self {
            series,
            profile,
            financials,
            chip_flow,
            source: provider.source(),
        }))
    }

    pub fn evaluation_inputs<'a>(
        &'a self,
        macro_context: Option<&'a MacroContext>,
        position: &'a PositionContext,
    ) -> EvaluationInputs<'a> {
        EvaluationInputs {
            series: &self.series,
            profile: &self.profile,
            financials: self.financials.as_deref(),
            chip_flow: self.chip_flow.as_ref(),
            macro_context,
            position,
        }
    }

    pub fn fingerprint(&self) -> String {
        dataset_fingerprint(&self.series)
    }
}

fn fill_blanks(profile: &mut SecurityProfile, hint: &SecurityProfile) {
    for (field, fallback) in [
        (&mut profile.short_name, &hint.short_name),
        (&mut profile.sector, &hint.sector),
        (&mut profile.industry, &hint.industry),
        (&mut profile.summary, &hint.summary),
    ] {
        if field.is_empty() {
            field.clone_from(fallback);
        }
    }
}

/// BLAKE3 over the symbol and every bar, hex-encoded.
pub fn dataset_fingerprint(series: &BarSeries) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(series.symbol().as_bytes());
    for bar in series.bars() {
        hasher.update(bar.date.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Score already-fetched securities in parallel. Output order matches input.
pub fn evaluate_batch(
    engine: &Engine,
    inputs: &[(SecurityInputs, PositionContext)],
    macro_context: Option<&MacroContext>,
) -> Vec<Evaluation> {
    inputs
        .par_iter()
        .map(|(security, position)| {
            engine.evaluate(&security.evaluation_inputs(macro_context, position))
        })
        .collect()
}

/// Scanner verdict for a ranked row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    StrongBuy,
    Sell,
    Watch,
}

impl Recommendation {
    /// Bullish action with reward/risk above `min_reward_risk` is a strong
    /// buy; a bearish action is a sell; anything else is watched.
    pub fn from_report(report: &ScoreReport, min_reward_risk: f64) -> Self {
        if report.action.is_bullish() && report.reward_risk > min_reward_risk {
            Recommendation::StrongBuy
        } else if report.action.is_bearish() {
            Recommendation::Sell
        } else {
            Recommendation::Watch
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recommendation::StrongBuy => f.write_str("strong buy"),
            Recommendation::Sell => f.write_str("sell"),
            Recommendation::Watch => f.write_str("watch"),
        }
    }
}

/// Close relative to the rolling VWAP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VwapRelation {
    Above,
    Below,
    Unknown,
}

impl VwapRelation {
    pub fn of(close: f64, vwap: Option<f64>) -> Self {
        match vwap {
            Some(v) if close > v => VwapRelation::Above,
            Some(_) => VwapRelation::Below,
            None => VwapRelation::Unknown,
        }
    }
}

/// One ranked line of a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRow {
    pub group: String,
    pub name: String,
    pub ticker: String,
    pub close: f64,
    pub branch: Branch,
    pub score: f64,
    /// Score rescaled to [-1, 1] so rows from both policies compare.
    pub normalized_score: f64,
    pub action: Action,
    pub recommendation: Recommendation,
    pub reward_risk: f64,
    pub vwap_relation: VwapRelation,
    pub protective_stop: f64,
    pub source: DataSource,
    pub fingerprint: String,
}

/// Result of scanning one watchlist entry.
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    Scored {
        report: Box<ScoreReport>,
        source: DataSource,
        fingerprint: String,
    },
    /// The provider has no bars for the ticker.
    NoData,
    InsufficientData { reason: EngineError },
    /// The bar source failed.
    Failed { error: String },
}

impl ScanOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ScanOutcome::Scored { .. } => "scored",
            ScanOutcome::NoData => "no data",
            ScanOutcome::InsufficientData { .. } => "insufficient data",
            ScanOutcome::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanItem {
    pub group: String,
    pub entry: WatchEntry,
    pub outcome: ScanOutcome,
}

impl ScanItem {
    pub fn report(&self) -> Option<&ScoreReport> {
        match &self.outcome {
            ScanOutcome::Scored { report, .. } => Some(report),
            _ => None,
        }
    }

    /// Ranked row, for scored items only.
    pub fn row(&self, min_reward_risk: f64) -> Option<ScanRow> {
        let ScanOutcome::Scored {
            report,
            source,
            fingerprint,
        } = &self.outcome
        else {
            return None;
        };
        Some(ScanRow {
            group: self.group.clone(),
            name: self.entry.name.clone(),
            ticker: self.entry.ticker.clone(),
            close: report.close,
            branch: report.branch,
            score: report.score,
            normalized_score: report.normalized_score(),
            action: report.action,
            recommendation: Recommendation::from_report(report, min_reward_risk),
            reward_risk: report.reward_risk,
            vwap_relation: VwapRelation::of(report.close, report.snapshot.vwap),
            protective_stop: report.protective_stop,
            source: *source,
            fingerprint: fingerprint.clone(),
        })
    }
}

/// Sort rows best first by normalised score; ties keep watchlist order.
pub fn rank(rows: &mut [ScanRow]) {
    rows.sort_by(|a, b| b.normalized_score.total_cmp(&a.normalized_score));
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    pub lookback_days: u32,
    /// Caller inputs applied to every security; group branches override.
    pub position: PositionContext,
    /// Reward/risk a bullish row needs to be called a strong buy.
    pub strong_buy_reward_risk: f64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            position: PositionContext::default(),
            strong_buy_reward_risk: 2.0,
        }
    }
}

impl ScanOptions {
    fn position_for(&self, group: &WatchGroup) -> PositionContext {
        PositionContext {
            branch_override: group.branch.or(self.position.branch_override),
            ..self.position.clone()
        }
    }
}

pub struct Scanner<'a, P: ?Sized> {
    provider: &'a P,
    engine: &'a Engine,
    options: ScanOptions,
}

impl<'a, P: MarketDataProvider + ?Sized> Scanner<'a, P> {
    pub fn new(provider: &'a P, engine: &'a Engine, options: ScanOptions) -> Self {
        Self {
            provider,
            engine,
            options,
        }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Market context shared by a scan. A failed lookup becomes `None`,
    /// which the engine scores with its conservative default.
    pub fn macro_context(&self) -> Option<MacroContext> {
        match self.provider.macro_snapshot() {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!(error = %e, "macro snapshot failed");
                None
            }
        }
    }

    /// Lazily fetch and score each watchlist entry in file order.
    pub fn scan<'w>(&'w self, watchlist: &'w Watchlist) -> ScanIter<'w, P> {
        ScanIter {
            scanner: self,
            entries: watchlist.entries().collect(),
            next: 0,
            macro_context: None,
        }
    }

    /// Fetch sequentially, then score everything in parallel with rayon.
    /// Items come back in watchlist order.
    pub fn scan_parallel(&self, watchlist: &Watchlist) -> Vec<ScanItem> {
        let macro_context = self.macro_context();
        let total = watchlist.len();
        let mut slots: Vec<(String, WatchEntry, Option<ScanOutcome>)> =
            Vec::with_capacity(total);
        let mut batch = Vec::new();

        for (i, (group, entry)) in watchlist.entries().enumerate() {
            info!(index = i + 1, total, ticker = %entry.ticker, "fetching");
            let outcome = match self.fetch(entry) {
                Ok(Some(inputs)) => {
                    batch.push((inputs, self.options.position_for(group)));
                    None
                }
                Ok(None) => Some(ScanOutcome::NoData),
                Err(e) => {
                    warn!(ticker = %entry.ticker, error = %e, "fetch failed");
                    Some(ScanOutcome::Failed {
                        error: e.to_string(),
                    })
                }
            };
            slots.push((group.name.clone(), entry.clone(), outcome));
        }

        let evaluations = evaluate_batch(self.engine, &batch, macro_context.as_ref());
        let mut scored = batch
            .iter()
            .zip(evaluations)
            .map(|((inputs, _), evaluation)| outcome_of(evaluation, inputs));

        slots
            .into_iter()
            .filter_map(|(group, entry, outcome)| {
                let outcome = outcome.or_else(|| scored.next())?;
                Some(ScanItem {
                    group,
                    entry,
                    outcome,
                })
            })
            .collect()
    }

    fn fetch(&self, entry: &WatchEntry) -> Result<Option<SecurityInputs>, DataError> {
        SecurityInputs::fetch(
            self.provider,
            &entry.ticker,
            &entry.profile_hint(),
            self.options.lookback_days,
        )
    }
}

fn outcome_of(evaluation: Evaluation, inputs: &SecurityInputs) -> ScanOutcome {
    match evaluation {
        Evaluation::Scored(report) => ScanOutcome::Scored {
            report,
            source: inputs.source,
            fingerprint: inputs.fingerprint(),
        },
        Evaluation::InsufficientData { reason, .. } => ScanOutcome::InsufficientData { reason },
    }
}

/// Pull-based scan over a watchlist. See [`Scanner::scan`].
pub struct ScanIter<'w, P: ?Sized> {
    scanner: &'w Scanner<'w, P>,
    entries: Vec<(&'w WatchGroup, &'w WatchEntry)>,
    next: usize,
    macro_context: Option<Option<MacroContext>>,
}

impl<P: MarketDataProvider + ?Sized> Iterator for ScanIter<'_, P> {
    type Item = ScanItem;

    fn next(&mut self) -> Option<ScanItem> {
        let (group, entry) = *self.entries.get(self.next)?;
        self.next += 1;

        let scanner = self.scanner;
        let macro_context = self
            .macro_context
            .get_or_insert_with(|| scanner.macro_context())
            .as_ref();

        info!(
            index = self.next,
            total = self.entries.len(),
            ticker = %entry.ticker,
            "scanning"
        );
        let outcome = match scanner.fetch(entry) {
            Ok(Some(inputs)) => {
                let position = scanner.options.position_for(group);
                let evaluation = scanner
                    .engine
                    .evaluate(&inputs.evaluation_inputs(macro_context, &position));
                outcome_of(evaluation, &inputs)
            }
            Ok(None) => ScanOutcome::NoData,
            Err(e) => {
                warn!(ticker = %entry.ticker, error = %e, "fetch failed");
                ScanOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        debug!(ticker = %entry.ticker, outcome = outcome.label(), "scanned");

        Some(ScanItem {
            group: group.name.clone(),
            entry: entry.clone(),
            outcome,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.entries.len() - self.next;
        (left, Some(left))
    }
}

impl<P: MarketDataProvider + ?Sized> ExactSizeIterator for ScanIter<'_, P> {}
