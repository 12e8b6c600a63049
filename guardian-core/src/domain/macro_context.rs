//! Market-wide regime and volatility context.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::bar::BarSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRegime {
    Bull,
    Correction,
    Bear,
}

/// Process-wide macro snapshot, shared read-only across one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroContext {
    pub regime: MarketRegime,
    /// Volatility index level (VIX-style). `None` when the index is unknown.
    pub volatility_index: Option<f64>,
    pub as_of: Option<NaiveDate>,
}

/// Bars required before a regime can be derived from an index.
const INDEX_MA_WINDOW: usize = 60;
const DRAWDOWN_WINDOW: usize = 250;
const BEAR_DRAWDOWN: f64 = 0.20;

impl MacroContext {
    /// Default used when the macro source is unavailable.
    pub fn conservative() -> Self {
        Self {
            regime: MarketRegime::Correction,
            volatility_index: None,
            as_of: None,
        }
    }

    /// Derive the regime from a benchmark index.
    ///
    /// Drawdown from the trailing 250-bar high above 20% is a bear market;
    /// a close below the 60-bar average is a correction; otherwise bull.
    /// Returns `None` with fewer than 60 bars or a non-finite last close.
    pub fn from_index_bars(index: &BarSeries, volatility_index: Option<f64>) -> Option<Self> {
        let bars = index.bars();
        if bars.len() < INDEX_MA_WINDOW {
            return None;
        }
        let last = index.last();
        if !last.close.is_finite() {
            return None;
        }

        let tail = &bars[bars.len() - INDEX_MA_WINDOW..];
        let ma = tail.iter().map(|b| b.close).sum::<f64>() / INDEX_MA_WINDOW as f64;

        let peak = bars[bars.len().saturating_sub(DRAWDOWN_WINDOW)..]
            .iter()
            .map(|b| b.high)
            .filter(|h| h.is_finite())
            .fold(f64::NEG_INFINITY, f64::max);
        let drawdown = if peak > 0.0 {
            1.0 - last.close / peak
        } else {
            0.0
        };

        let regime = if drawdown > BEAR_DRAWDOWN {
            MarketRegime::Bear
        } else if ma.is_finite() && last.close < ma {
            MarketRegime::Correction
        } else {
            MarketRegime::Bull
        };

        Some(Self {
            regime,
            volatility_index,
            as_of: Some(last.date),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;

    fn index_from_closes(closes: &[f64]) -> BarSeries {
        let base = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                date: base + chrono::Duration::days(i as i64),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1,
            })
            .collect();
        BarSeries::new("^TWII", bars).unwrap()
    }

    #[test]
    fn rising_index_is_bull() {
        let closes: Vec<f64> = (0..120).map(|i| 100.0 + i as f64).collect();
        let ctx = MacroContext::from_index_bars(&index_from_closes(&closes), Some(14.0)).unwrap();
        assert_eq!(ctx.regime, MarketRegime::Bull);
        assert_eq!(ctx.volatility_index, Some(14.0));
    }

    #[test]
    fn dip_below_average_is_correction() {
        let mut closes = vec![100.0; 119];
        closes.push(95.0);
        let ctx = MacroContext::from_index_bars(&index_from_closes(&closes), None).unwrap();
        assert_eq!(ctx.regime, MarketRegime::Correction);
    }

    #[test]
    fn deep_drawdown_is_bear() {
        let mut closes = vec![100.0; 100];
        closes.extend(std::iter::repeat(70.0).take(20));
        let ctx = MacroContext::from_index_bars(&index_from_closes(&closes), None).unwrap();
        assert_eq!(ctx.regime, MarketRegime::Bear);
    }

    #[test]
    fn short_index_is_none() {
        let closes = vec![100.0; 30];
        assert!(MacroContext::from_index_bars(&index_from_closes(&closes), None).is_none());
    }
}
