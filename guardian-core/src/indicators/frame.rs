//! The full set of derived series the evaluators read.

use serde::{Deserialize, Serialize};

use super::rolling::{pct_change, rolling_mean};
use super::{
    defined, Atr, Indicator, Obv, PricePosition, RollingHigh, Rsi, Slope, Sma, StochasticK,
    Volatility, Vwap,
};
use crate::domain::{Bar, BarSeries};
use crate::error::EngineError;
use crate::risk::protective_stop;

/// Indicator windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub ma_short: usize,
    pub ma_long: usize,
    pub rsi: usize,
    pub stochastic: usize,
    pub atr: usize,
    /// Window of the one-bar-shifted high the protective stop hangs from.
    pub stop_high: usize,
    /// ATR multiple subtracted from the shifted high.
    pub stop_atr_multiple: f64,
    pub vwap: usize,
    pub slope: usize,
    /// Cap of the expanding high/low window used for position.
    pub position_lookback: usize,
    pub swing_high: usize,
    pub obv_average: usize,
    pub volume_short: usize,
    pub volume_long: usize,
    pub price_change: usize,
    pub volatility: usize,
    /// Floor on the history an evaluation requires.
    pub min_history: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ma_short: 20,
            ma_long: 60,
            rsi: 14,
            stochastic: 9,
            atr: 14,
            stop_high: 20,
            stop_atr_multiple: 2.0,
            vwap: 20,
            slope: 10,
            position_lookback: 500,
            swing_high: 60,
            obv_average: 20,
            volume_short: 5,
            volume_long: 20,
            price_change: 5,
            volatility: 20,
            min_history: 65,
        }
    }
}

impl IndicatorParams {
    /// Bars needed before the latest values of every fixed window are defined.
    ///
    /// Position uses an expanding window and does not count.
    pub fn required_history(&self) -> usize {
        let largest = [
            self.ma_short,
            self.ma_long,
            self.rsi + 1,
            self.stochastic,
            self.atr + 1,
            self.stop_high + 1,
            self.vwap,
            self.slope,
            self.swing_high,
            self.obv_average,
            self.volume_short,
            self.volume_long,
            self.price_change + 1,
            self.volatility + 1,
        ]
        .into_iter()
        .max()
        .unwrap_or(0);
        self.min_history.max(largest + 1)
    }

    /// Window sizes as (name, value) pairs, for validation.
    pub fn windows(&self) -> [(&'static str, usize); 16] {
        [
            ("ma_short", self.ma_short),
            ("ma_long", self.ma_long),
            ("rsi", self.rsi),
            ("stochastic", self.stochastic),
            ("atr", self.atr),
            ("stop_high", self.stop_high),
            ("vwap", self.vwap),
            ("slope", self.slope),
            ("position_lookback", self.position_lookback),
            ("swing_high", self.swing_high),
            ("obv_average", self.obv_average),
            ("volume_short", self.volume_short),
            ("volume_long", self.volume_long),
            ("price_change", self.price_change),
            ("volatility", self.volatility),
            ("min_history", self.min_history),
        ]
    }
}

/// Parallel series, one value per bar, NaN where undefined.
#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    pub close: Vec<f64>,
    pub ma_short: Vec<f64>,
    pub ma_long: Vec<f64>,
    /// % deviation of close from the short MA.
    pub bias: Vec<f64>,
    pub rsi: Vec<f64>,
    pub stoch_k: Vec<f64>,
    pub atr: Vec<f64>,
    pub high_shifted: Vec<f64>,
    pub protective_stop: Vec<f64>,
    pub vwap: Vec<f64>,
    pub obv: Vec<f64>,
    pub obv_ma: Vec<f64>,
    pub position: Vec<f64>,
    pub slope_pct: Vec<f64>,
    pub swing_high: Vec<f64>,
    pub volume_short: Vec<f64>,
    pub volume_long: Vec<f64>,
    pub change_pct: Vec<f64>,
    pub volatility: Vec<f64>,
}

/// One bar's view of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub close: Option<f64>,
    pub ma_short: Option<f64>,
    pub ma_long: Option<f64>,
    pub bias: Option<f64>,
    pub rsi: Option<f64>,
    pub stoch_k: Option<f64>,
    pub atr: Option<f64>,
    pub high_shifted: Option<f64>,
    pub protective_stop: Option<f64>,
    pub vwap: Option<f64>,
    pub obv: Option<f64>,
    pub obv_ma: Option<f64>,
    pub position: Option<f64>,
    pub slope_pct: Option<f64>,
    pub swing_high: Option<f64>,
    pub volume_short: Option<f64>,
    pub volume_long: Option<f64>,
    pub change_pct: Option<f64>,
    pub volatility: Option<f64>,
}

impl IndicatorFrame {
    /// Compute every series, or fail when the history is too short to trust.
    pub fn compute(series: &BarSeries, params: &IndicatorParams) -> Result<Self, EngineError> {
        let required = params.required_history();
        if series.len() < required {
            return Err(EngineError::InsufficientHistory {
                required,
                available: series.len(),
            });
        }
        Ok(Self::compute_unchecked(series.bars(), params))
    }

    /// Compute without the history check. Short inputs yield NaN-filled series.
    pub fn compute_unchecked(bars: &[Bar], params: &IndicatorParams) -> Self {
        let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();

        let ma_short = Sma::new(params.ma_short).compute(bars);
        let ma_long = Sma::new(params.ma_long).compute(bars);
        let bias = close
            .iter()
            .zip(&ma_short)
            .map(|(&c, &m)| if m != 0.0 { (c - m) / m * 100.0 } else { f64::NAN })
            .collect();

        let atr = Atr::new(params.atr).compute(bars);
        let high_shifted = RollingHigh::shifted(params.stop_high).compute(bars);
        let protective_stop = high_shifted
            .iter()
            .zip(&atr)
            .map(|(&h, &a)| protective_stop(h, a, params.stop_atr_multiple).unwrap_or(f64::NAN))
            .collect();

        let obv = Obv::new().compute(bars);
        let obv_ma = rolling_mean(&obv, params.obv_average);

        let frame = Self {
            ma_short,
            ma_long,
            bias,
            rsi: Rsi::new(params.rsi).compute(bars),
            stoch_k: StochasticK::new(params.stochastic).compute(bars),
            atr,
            high_shifted,
            protective_stop,
            vwap: Vwap::new(params.vwap).compute(bars),
            obv,
            obv_ma,
            position: PricePosition::new(params.position_lookback).compute(bars),
            slope_pct: Slope::new(params.slope).compute(bars),
            swing_high: RollingHigh::new(params.swing_high).compute(bars),
            volume_short: rolling_mean(&volumes, params.volume_short),
            volume_long: rolling_mean(&volumes, params.volume_long),
            change_pct: pct_change(&close, params.price_change),
            volatility: Volatility::new(params.volatility).compute(bars),
            close,
        };
        debug_assert!(frame.columns().iter().all(|c| c.len() == bars.len()));
        frame
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    fn columns(&self) -> [&Vec<f64>; 19] {
        [
            &self.close,
            &self.ma_short,
            &self.ma_long,
            &self.bias,
            &self.rsi,
            &self.stoch_k,
            &self.atr,
            &self.high_shifted,
            &self.protective_stop,
            &self.vwap,
            &self.obv,
            &self.obv_ma,
            &self.position,
            &self.slope_pct,
            &self.swing_high,
            &self.volume_short,
            &self.volume_long,
            &self.change_pct,
            &self.volatility,
        ]
    }

    /// Values at bar `i`; `None` if `i` is out of range.
    pub fn at(&self, i: usize) -> Option<IndicatorSnapshot> {
        if i >= self.len() {
            return None;
        }
        Some(IndicatorSnapshot {
            close: defined(self.close[i]),
            ma_short: defined(self.ma_short[i]),
            ma_long: defined(self.ma_long[i]),
            bias: defined(self.bias[i]),
            rsi: defined(self.rsi[i]),
            stoch_k: defined(self.stoch_k[i]),
            atr: defined(self.atr[i]),
            high_shifted: defined(self.high_shifted[i]),
            protective_stop: defined(self.protective_stop[i]),
            vwap: defined(self.vwap[i]),
            obv: defined(self.obv[i]),
            obv_ma: defined(self.obv_ma[i]),
            position: defined(self.position[i]),
            slope_pct: defined(self.slope_pct[i]),
            swing_high: defined(self.swing_high[i]),
            volume_short: defined(self.volume_short[i]),
            volume_long: defined(self.volume_long[i]),
            change_pct: defined(self.change_pct[i]),
            volatility: defined(self.volatility[i]),
        })
    }

    pub fn latest(&self) -> Option<IndicatorSnapshot> {
        self.len().checked_sub(1).and_then(|i| self.at(i))
    }

    /// Close and protective stop for bar `i`, both defined.
    pub fn close_and_stop(&self, i: usize) -> Option<(f64, f64)> {
        let close = defined(*self.close.get(i)?)?;
        let stop = defined(*self.protective_stop.get(i)?)?;
        Some((close, stop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, make_ohlcv};

    fn series(bars: Vec<Bar>) -> BarSeries {
        BarSeries::new("TEST", bars).unwrap()
    }

    #[test]
    fn default_required_history_is_65() {
        assert_eq!(IndicatorParams::default().required_history(), 65);
    }

    #[test]
    fn required_history_follows_long_windows() {
        let params = IndicatorParams {
            ma_long: 120,
            ..IndicatorParams::default()
        };
        assert_eq!(params.required_history(), 121);
    }

    #[test]
    fn short_history_is_rejected() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let err = IndicatorFrame::compute(&series(make_bars(&closes)), &IndicatorParams::default())
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InsufficientHistory {
                required: 65,
                available: 40
            }
        );
    }

    #[test]
    fn flat_market_stop_is_high_minus_two_atr() {
        let data: Vec<_> = (0..300).map(|_| (100.0, 100.0, 98.0, 100.0, 1000)).collect();
        let frame =
            IndicatorFrame::compute(&series(make_ohlcv(&data)), &IndicatorParams::default()).unwrap();
        let snap = frame.latest().unwrap();
        assert_approx(snap.atr.unwrap(), 2.0, 1e-9);
        assert_approx(snap.protective_stop.unwrap(), 96.0, 1e-9);
        assert_approx(snap.bias.unwrap(), 0.0, 1e-9);
        assert_approx(snap.position.unwrap(), 1.0, 1e-9);
        assert_approx(snap.slope_pct.unwrap(), 0.0, 1e-9);
        assert_eq!(snap.rsi, None);
    }

    #[test]
    fn every_series_matches_bar_count() {
        let closes: Vec<f64> = (0..80).map(|i| 50.0 + (i as f64 * 0.3).sin()).collect();
        let frame = IndicatorFrame::compute_unchecked(&make_bars(&closes), &IndicatorParams::default());
        assert_eq!(frame.len(), 80);
        assert!(frame.columns().iter().all(|c| c.len() == 80));
        assert!(frame.at(80).is_none());
    }

    #[test]
    fn params_deserialize_with_defaults() {
        let params: IndicatorParams = toml::from_str("ma_short = 10").unwrap();
        assert_eq!(params.ma_short, 10);
        assert_eq!(params.ma_long, 60);
    }
}
