//! Market data provider trait and structured error types.
//!
//! The MarketDataProvider trait abstracts over data sources (Yahoo Finance,
//! CSV directories, synthetic walks) so the scanner can swap implementations
//! and tests can run offline.
//!
//! Every lookup returns `Result<Option<T>, DataError>`: `Ok(None)` means the
//! source has nothing for the request, `Err` means the source itself failed.
//! Neither case is fatal for an evaluation; the scanner degrades to the
//! engine's missing-data handling.

use chrono::NaiveDate;
use guardian_core::domain::{
    BarError, BarSeries, ChipFlowStatus, MacroContext, QuarterlyReport, SecurityProfile,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record in {path}: {reason}")]
    Malformed { path: String, reason: String },

    #[error("invalid bar series: {0}")]
    InvalidSeries(#[from] BarError),

    #[error("data error: {0}")]
    Other(String),
}

/// Where a series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    CsvDirectory,
    Synthetic,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::YahooFinance => f.write_str("yahoo"),
            DataSource::CsvDirectory => f.write_str("csv"),
            DataSource::Synthetic => f.write_str("synthetic"),
        }
    }
}

/// Source of bars, reference data and macro context for the engine.
///
/// Only `history` is mandatory. The remaining lookups default to "absent",
/// which the engine handles as missing data.
pub trait MarketDataProvider: Send + Sync {
    /// Which source backs this provider.
    fn source(&self) -> DataSource;

    /// Daily bars covering roughly the last `lookback_days` calendar days.
    fn history(&self, ticker: &str, lookback_days: u32) -> Result<Option<BarSeries>, DataError>;

    fn profile(&self, _ticker: &str) -> Result<Option<SecurityProfile>, DataError> {
        Ok(None)
    }

    /// Quarterly reports, most recent first.
    fn quarterly_statements(
        &self,
        _ticker: &str,
    ) -> Result<Option<Vec<QuarterlyReport>>, DataError> {
        Ok(None)
    }

    fn institutional_flow(
        &self,
        _ticker: &str,
        _date: NaiveDate,
    ) -> Result<Option<ChipFlowStatus>, DataError> {
        Ok(None)
    }

    /// Process-wide market context.
    fn macro_snapshot(&self) -> Result<Option<MacroContext>, DataError> {
        Ok(None)
    }
}

impl<P: MarketDataProvider + ?Sized> MarketDataProvider for Box<P> {
    fn source(&self) -> DataSource {
        (**self).source()
    }

    fn history(&self, ticker: &str, lookback_days: u32) -> Result<Option<BarSeries>, DataError> {
        (**self).history(ticker, lookback_days)
    }

    fn profile(&self, ticker: &str) -> Result<Option<SecurityProfile>, DataError> {
        (**self).profile(ticker)
    }

    fn quarterly_statements(
        &self,
        ticker: &str,
    ) -> Result<Option<Vec<QuarterlyReport>>, DataError> {
        (**self).quarterly_statements(ticker)
    }

    fn institutional_flow(
        &self,
        ticker: &str,
        date: NaiveDate,
    ) -> Result<Option<ChipFlowStatus>, DataError> {
        (**self).institutional_flow(ticker, date)
    }

    fn macro_snapshot(&self) -> Result<Option<MacroContext>, DataError> {
        (**self).macro_snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BarsOnly;

    impl MarketDataProvider for BarsOnly {
        fn source(&self) -> DataSource {
            DataSource::Synthetic
        }

        fn history(&self, _: &str, _: u32) -> Result<Option<BarSeries>, DataError> {
            Ok(None)
        }
    }

    #[test]
    fn optional_lookups_default_to_absent() {
        let p: Box<dyn MarketDataProvider> = Box::new(BarsOnly);
        assert!(p.profile("2330").unwrap().is_none());
        assert!(p.quarterly_statements("2330").unwrap().is_none());
        assert!(p.macro_snapshot().unwrap().is_none());
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert!(p.institutional_flow("2330", day).unwrap().is_none());
    }

    #[test]
    fn errors_render() {
        let e = DataError::RateLimited {
            retry_after_secs: 60,
        };
        assert!(e.to_string().contains("60s"));
        assert_eq!(DataSource::CsvDirectory.to_string(), "csv");
    }
}
