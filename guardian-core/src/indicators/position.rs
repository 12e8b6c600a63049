//! Price position within the historical high/low range, in [0, 1].
//!
//! The window is the last `lookback` bars, or every bar so far when fewer
//! exist, so young listings still get a position. 0 = lowest low,
//! 1 = highest high; a zero range is undefined.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct PricePosition {
    lookback: usize,
    name: String,
}

impl PricePosition {
    pub fn new(lookback: usize) -> Self {
        assert!(lookback >= 1, "position lookback must be >= 1");
        Self {
            lookback,
            name: format!("position_{lookback}"),
        }
    }
}

impl Indicator for PricePosition {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut result = vec![f64::NAN; bars.len()];
        for (i, bar) in bars.iter().enumerate() {
            let start = (i + 1).saturating_sub(self.lookback);
            let window = &bars[start..=i];
            let mut hi = f64::NEG_INFINITY;
            let mut lo = f64::INFINITY;
            let mut complete = true;
            for b in window {
                if b.high.is_nan() || b.low.is_nan() {
                    complete = false;
                    break;
                }
                hi = hi.max(b.high);
                lo = lo.min(b.low);
            }
            let range = hi - lo;
            if complete && range > 0.0 && bar.close.is_finite() {
                result[i] = ((bar.close - lo) / range).clamp(0.0, 1.0);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlcv, DEFAULT_EPSILON};

    #[test]
    fn expanding_then_capped() {
        let bars = make_ohlcv(&[
            (10.0, 20.0, 10.0, 15.0, 1),
            (15.0, 16.0, 14.0, 15.0, 1),
            (15.0, 16.0, 14.0, 16.0, 1),
        ]);
        let p = PricePosition::new(2).compute(&bars);
        assert_approx(p[0], 0.5, DEFAULT_EPSILON);
        assert_approx(p[1], 0.5, DEFAULT_EPSILON);
        // window drops bar 0: range 14..16
        assert_approx(p[2], 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn zero_range_is_undefined() {
        let bars = make_ohlcv(&[(5.0, 5.0, 5.0, 5.0, 1); 3]);
        assert!(PricePosition::new(500).compute(&bars).iter().all(|v| v.is_nan()));
    }
}
