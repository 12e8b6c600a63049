//! Quarterly financial statements.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Minimum spacing between two consecutive quarterly report dates.
pub const MIN_REPORT_GAP_DAYS: i64 = 70;

/// One quarter of the figures the fundamental evaluator reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyReport {
    pub report_date: NaiveDate,
    /// Earnings per share for the quarter.
    pub eps: f64,
    /// Gross margin as a fraction (0.42 = 42%).
    pub gross_margin: f64,
    pub inventory: f64,
    pub cost_of_revenue: f64,
    /// Return on equity in percent, when the source publishes it.
    #[serde(default)]
    pub roe: Option<f64>,
}

impl QuarterlyReport {
    /// Inventory turnover days: inventory / cost of revenue x 91.
    ///
    /// `None` when cost of revenue is not positive.
    pub fn inventory_days(&self) -> Option<f64> {
        if self.cost_of_revenue > 0.0 && self.inventory.is_finite() {
            Some(self.inventory / self.cost_of_revenue * 91.0)
        } else {
            None
        }
    }
}

/// The two most recent quarters, most-recent-first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialSnapshot {
    latest: QuarterlyReport,
    prior: QuarterlyReport,
}

impl FinancialSnapshot {
    /// Build from two quarters; rejects mis-ordered or too-close report dates.
    pub fn new(latest: QuarterlyReport, prior: QuarterlyReport) -> Result<Self, EngineError> {
        let gap_days = (latest.report_date - prior.report_date).num_days();
        if gap_days < MIN_REPORT_GAP_DAYS {
            return Err(EngineError::InconsistentReportOrdering {
                latest: latest.report_date,
                prior: prior.report_date,
                gap_days,
                min_gap_days: MIN_REPORT_GAP_DAYS,
            });
        }
        Ok(Self { latest, prior })
    }

    /// Build from a provider list ordered most-recent-first.
    ///
    /// Only the first two entries are read; the caller's ordering is trusted
    /// and verified, never re-sorted.
    pub fn from_reports(reports: &[QuarterlyReport]) -> Result<Self, EngineError> {
        match reports {
            [latest, prior, ..] => Self::new(latest.clone(), prior.clone()),
            _ => Err(EngineError::NotEnoughReports(reports.len())),
        }
    }

    pub fn latest(&self) -> &QuarterlyReport {
        &self.latest
    }

    pub fn prior(&self) -> &QuarterlyReport {
        &self.prior
    }

    /// Days between the latest report and `as_of`.
    pub fn age_days(&self, as_of: NaiveDate) -> i64 {
        (as_of - self.latest.report_date).num_days()
    }

    pub fn margin_expanding(&self) -> bool {
        self.latest.gross_margin > self.prior.gross_margin
    }

    /// Quarter-over-quarter EPS growth in percent, `None` when prior EPS is zero.
    pub fn eps_growth_pct(&self) -> Option<f64> {
        if self.prior.eps == 0.0 {
            return None;
        }
        Some((self.latest.eps - self.prior.eps) / self.prior.eps.abs() * 100.0)
    }
}
