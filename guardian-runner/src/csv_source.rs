//! Offline provider backed by a directory of flat files.
//!
//! Layout, per ticker `T`:
//! - `T.csv`: `date,open,high,low,close,volume` (required for history)
//! - `T.financials.csv`: `report_date,eps,gross_margin,inventory,cost_of_revenue,roe`
//! - `T.flow.csv`: `date,foreign_net,trust_net`
//! - `T.profile.toml`: `short_name`, `sector`, `industry`, `summary`
//!
//! plus an optional `macro.toml` holding the market context. A missing file
//! means "absent"; a file that exists but does not parse is an error.

use crate::provider::{DataError, DataSource, MarketDataProvider};
use chrono::{Duration, NaiveDate};
use guardian_core::domain::{
    Bar, BarSeries, ChipFlow, ChipFlowStatus, MacroContext, QuarterlyReport, SecurityProfile,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Empty price cells are carried as NaN.
#[derive(Debug, Deserialize)]
struct BarRow {
    date: NaiveDate,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    #[serde(default)]
    volume: Option<u64>,
}

impl From<BarRow> for Bar {
    fn from(row: BarRow) -> Self {
        Bar {
            date: row.date,
            open: row.open.unwrap_or(f64::NAN),
            high: row.high.unwrap_or(f64::NAN),
            low: row.low.unwrap_or(f64::NAN),
            close: row.close.unwrap_or(f64::NAN),
            volume: row.volume.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: String) -> PathBuf {
        self.dir.join(file)
    }

    /// All rows of a CSV file, or `None` when the file does not exist.
    fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Option<Vec<T>>, DataError> {
        if !path.exists() {
            return Ok(None);
        }
        let display = path.display().to_string();
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| DataError::Malformed {
                path: display.clone(),
                reason: e.to_string(),
            })?;
        let rows = reader
            .deserialize()
            .collect::<Result<Vec<T>, _>>()
            .map_err(|e| DataError::Malformed {
                path: display,
                reason: e.to_string(),
            })?;
        Ok(Some(rows))
    }

    fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, DataError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(DataError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        toml::from_str(&text)
            .map(Some)
            .map_err(|e| DataError::Malformed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
    }
}

impl MarketDataProvider for CsvProvider {
    fn source(&self) -> DataSource {
        DataSource::CsvDirectory
    }

    fn history(&self, ticker: &str, lookback_days: u32) -> Result<Option<BarSeries>, DataError> {
        let path = self.path(format!("{ticker}.csv"));
        let Some(rows) = Self::read_rows::<BarRow>(&path)? else {
            debug!(ticker, path = %path.display(), "no bar file");
            return Ok(None);
        };
        if rows.is_empty() {
            return Ok(None);
        }
        let series = BarSeries::from_unsorted(ticker, rows.into_iter().map(Bar::from).collect())?;
        let cutoff = series.last().date - Duration::days(i64::from(lookback_days));
        let kept: Vec<Bar> = series
            .bars()
            .iter()
            .filter(|b| b.date >= cutoff)
            .copied()
            .collect();
        Ok(Some(BarSeries::new(ticker, kept)?))
    }

    fn profile(&self, ticker: &str) -> Result<Option<SecurityProfile>, DataError> {
        Self::read_toml(&self.path(format!("{ticker}.profile.toml")))
    }

    fn quarterly_statements(
        &self,
        ticker: &str,
    ) -> Result<Option<Vec<QuarterlyReport>>, DataError> {
        let path = self.path(format!("{ticker}.financials.csv"));
        Ok(Self::read_rows::<QuarterlyReport>(&path)?.map(|mut reports| {
            reports.sort_by(|a, b| b.report_date.cmp(&a.report_date));
            reports
        }))
    }

    fn institutional_flow(
        &self,
        ticker: &str,
        date: NaiveDate,
    ) -> Result<Option<ChipFlowStatus>, DataError> {
        let path = self.path(format!("{ticker}.flow.csv"));
        let Some(rows) = Self::read_rows::<ChipFlow>(&path)? else {
            return Ok(None);
        };
        Ok(Some(match rows.into_iter().find(|f| f.date == date) {
            Some(flow) => ChipFlowStatus::Available(flow),
            None => ChipFlowStatus::unavailable(format!("no flow row for {date}")),
        }))
    }

    fn macro_snapshot(&self) -> Result<Option<MacroContext>, DataError> {
        Self::read_toml(&self.path("macro.toml".to_string()))
    }
}
