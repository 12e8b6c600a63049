//! Daily bars and the ordered series the engine evaluates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Daily OHLCV bar for a single session.
///
/// Missing prints are carried as NaN; indicators propagate them as undefined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Returns true if any OHLC field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open/close, prices positive.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }

    /// Typical price (H+L+C)/3, the VWAP reference.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarError {
    #[error("bar series for '{symbol}' is empty")]
    Empty { symbol: String },

    #[error("bar dates not strictly increasing at index {index}: {previous} then {current}")]
    NotIncreasing {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },
}

/// Ordered, immutable sequence of bars for one security.
///
/// Dates are strictly increasing. Gaps (holidays, suspensions) are tolerated.
#[derive(Debug, Clone, Serialize)]
pub struct BarSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, BarError> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(BarError::Empty { symbol });
        }
        for (i, pair) in bars.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(BarError::NotIncreasing {
                    index: i + 1,
                    previous: pair[0].date,
                    current: pair[1].date,
                });
            }
        }
        Ok(Self { symbol, bars })
    }

    /// Sorts and de-duplicates by date before validating. Later duplicates win.
    pub fn from_unsorted(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Result<Self, BarError> {
        bars.sort_by_key(|b| b.date);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self::new(symbol, deduped)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Last bar. Construction guarantees at least one.
    pub fn last(&self) -> &Bar {
        &self.bars[self.bars.len() - 1]
    }

    /// Series truncated to the first `len` bars, for causality checks.
    pub fn truncated(&self, len: usize) -> Result<Self, BarError> {
        let len = len.min(self.bars.len());
        Self::new(self.symbol.clone(), self.bars[..len].to_vec())
    }
}
