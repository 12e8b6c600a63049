//! On-Balance Volume: cumulative directional volume.
//!
//! OBV[0] = 0; volume is added on up closes, subtracted on down closes and
//! ignored on unchanged closes. A NaN close carries the running total forward.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Default)]
pub struct Obv;

impl Obv {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for Obv {
    fn name(&self) -> &str {
        "obv"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut result = Vec::with_capacity(bars.len());
        let mut running = 0.0;
        for (i, bar) in bars.iter().enumerate() {
            if i > 0 {
                let prev = bars[i - 1].close;
                let volume = bar.volume as f64;
                if bar.close > prev {
                    running += volume;
                } else if bar.close < prev {
                    running -= volume;
                }
            }
            result.push(running);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlcv, DEFAULT_EPSILON};

    #[test]
    fn accumulates_direction() {
        let bars = make_ohlcv(&[
            (10.0, 10.0, 10.0, 10.0, 100),
            (11.0, 11.0, 11.0, 11.0, 200),
            (10.0, 10.0, 10.0, 10.0, 50),
            (10.0, 10.0, 10.0, 10.0, 999),
        ]);
        let obv = Obv::new().compute(&bars);
        assert_approx(obv[0], 0.0, DEFAULT_EPSILON);
        assert_approx(obv[1], 200.0, DEFAULT_EPSILON);
        assert_approx(obv[2], 150.0, DEFAULT_EPSILON);
        assert_approx(obv[3], 150.0, DEFAULT_EPSILON);
    }
}
