//! Engine error taxonomy.
//!
//! `InsufficientHistory` and `UndefinedLatest` are fatal for an evaluation
//! and surface as [`Evaluation::InsufficientData`](crate::Evaluation). The
//! remaining variants are raised by input constructors and downgraded by the
//! engine to [`DataIssue`](crate::report::DataIssue) entries on the report.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::BarError;

#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineError {
    #[error("insufficient history: need {required} bars, have {available}")]
    InsufficientHistory { required: usize, available: usize },

    /// A statistic the score depends on is null on the latest bar.
    #[error("{what} undefined on the latest bar")]
    UndefinedLatest { what: String },

    #[error(
        "quarterly reports inconsistent: {latest} is {gap_days} days after {prior} \
         (expected most-recent-first, at least {min_gap_days} days apart)"
    )]
    InconsistentReportOrdering {
        latest: NaiveDate,
        prior: NaiveDate,
        gap_days: i64,
        min_gap_days: i64,
    },

    #[error("need two quarterly reports, got {0}")]
    NotEnoughReports(usize),

    #[error("invalid bar series: {0}")]
    InvalidSeries(#[from] BarError),
}
