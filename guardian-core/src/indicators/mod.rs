//! Causal technical indicators.
//!
//! Every indicator is a pure function from a bar slice to a series of the same
//! length. Values are `f64::NAN` until the window is filled and wherever an
//! input is missing or a ratio would divide by zero. [`IndicatorFrame`] bundles
//! the series the evaluators read and exposes them as `Option<f64>`.
//!
//! # Look-ahead contamination guard
//! No value at bar t may depend on bar t+1 or later. Support/resistance
//! extremes used for stops are additionally shifted by one bar so the level
//! for bar t excludes bar t itself.

pub mod atr;
pub mod extremes;
pub mod frame;
pub mod obv;
pub mod position;
pub mod rolling;
pub mod rsi;
pub mod slope;
pub mod sma;
pub mod stochastic;
pub mod volatility;
pub mod vwap;

pub use atr::Atr;
pub use extremes::{RollingHigh, RollingLow};
pub use frame::{IndicatorFrame, IndicatorParams, IndicatorSnapshot};
pub use obv::Obv;
pub use position::PricePosition;
pub use rsi::Rsi;
pub use slope::Slope;
pub use sma::Sma;
pub use stochastic::StochasticK;
pub use volatility::Volatility;
pub use vwap::Vwap;

use crate::domain::Bar;

/// A causal indicator over daily bars.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "atr_14").
    fn name(&self) -> &str;

    /// Number of leading bars that are always NaN.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// NaN-as-null to `Option`.
pub(crate) fn defined(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

/// Synthetic bars from closes: open = previous close, high/low = +/-1 around the body.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Bars from explicit (open, high, low, close, volume) tuples.
#[cfg(test)]
pub fn make_ohlcv(data: &[(f64, f64, f64, f64, u64)]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close, volume))| Bar {
            date: base_date + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume,
        })
        .collect()
}

#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
