//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR uses Wilder smoothing (EMA with alpha = 1/period), seeded with the mean
//! of the first `period` true ranges. Lookback: period.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// True Range series. TR[0] is NaN: without a previous close it is not a true range.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut tr = vec![f64::NAN; bars.len()];
    for i in 1..bars.len() {
        let (h, l, pc) = (bars[i].high, bars[i].low, bars[i - 1].close);
        if !(h.is_nan() || l.is_nan() || pc.is_nan()) {
            tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
        }
    }
    tr
}

/// Wilder smoothing with alpha = 1/period.
///
/// The seed is the mean of the first run of `period` consecutive defined
/// values. A NaN after the seed re-seeds from the next full run, so one
/// missing print does not blank the rest of the series.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let alpha = 1.0 / period as f64;
    let mut prev: Option<f64> = None;
    let mut run_sum = 0.0;
    let mut run_len = 0usize;

    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            prev = None;
            run_sum = 0.0;
            run_len = 0;
            continue;
        }
        match prev {
            Some(p) => {
                let smoothed = alpha * v + (1.0 - alpha) * p;
                result[i] = smoothed;
                prev = Some(smoothed);
            }
            None => {
                run_sum += v;
                run_len += 1;
                if run_len == period {
                    let seed = run_sum / period as f64;
                    result[i] = seed;
                    prev = Some(seed);
                }
            }
        }
    }

    result
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        wilder_smooth(&true_range(bars), self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlcv, DEFAULT_EPSILON};

    #[test]
    fn true_range_basic() {
        let bars = make_ohlcv(&[
            (100.0, 105.0, 95.0, 102.0, 1),
            (102.0, 108.0, 100.0, 106.0, 1), // max(8, 6, 2) = 8
            (106.0, 107.0, 98.0, 99.0, 1),   // max(9, 1, 8) = 9
        ]);
        let tr = true_range(&bars);
        assert!(tr[0].is_nan());
        assert_approx(tr[1], 8.0, DEFAULT_EPSILON);
        assert_approx(tr[2], 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let bars = make_ohlcv(&[
            (98.0, 102.0, 97.0, 100.0, 1),
            (110.0, 115.0, 108.0, 112.0, 1), // max(7, 15, 8) = 15
        ]);
        assert_approx(true_range(&bars)[1], 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_period_3() {
        let bars = make_ohlcv(&[
            (100.0, 105.0, 95.0, 102.0, 1),
            (102.0, 108.0, 100.0, 106.0, 1), // TR = 8
            (106.0, 107.0, 98.0, 99.0, 1),   // TR = 9
            (99.0, 103.0, 97.0, 101.0, 1),   // TR = 6
            (101.0, 106.0, 100.0, 105.0, 1), // TR = 6
        ]);
        let result = Atr::new(3).compute(&bars);
        assert!(result[2].is_nan());
        assert_approx(result[3], 23.0 / 3.0, DEFAULT_EPSILON);
        assert_approx(result[4], 64.0 / 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn constant_range_atr_equals_range() {
        let data: Vec<_> = (0..30).map(|_| (99.0, 100.0, 98.0, 100.0, 1)).collect();
        let result = Atr::new(14).compute(&make_ohlcv(&data));
        assert!(result[13].is_nan());
        assert_approx(result[14], 2.0, DEFAULT_EPSILON);
        assert_approx(result[29], 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn wilder_reseeds_after_gap() {
        let values = [f64::NAN, 2.0, 2.0, f64::NAN, 4.0, 4.0, 4.0];
        let r = wilder_smooth(&values, 2);
        assert_approx(r[2], 2.0, DEFAULT_EPSILON);
        assert!(r[3].is_nan());
        assert!(r[4].is_nan());
        assert_approx(r[5], 4.0, DEFAULT_EPSILON);
        assert_approx(r[6], 4.0, DEFAULT_EPSILON);
    }
}
