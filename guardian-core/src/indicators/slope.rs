//! Normalised least-squares price slope.
//!
//! Slope[t] = OLS slope of closes over the `period` bars ending at t (x = 0..period),
//! divided by close[t] and scaled to a percentage per bar.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Slope {
    period: usize,
    name: String,
}

impl Slope {
    pub fn new(period: usize) -> Self {
        assert!(period >= 2, "slope period must be >= 2");
        Self {
            period,
            name: format!("slope_{period}"),
        }
    }
}

/// OLS slope of `ys` against x = 0, 1, .., len-1.
pub fn least_squares_slope(ys: &[f64]) -> f64 {
    let n = ys.len() as f64;
    if ys.len() < 2 {
        return f64::NAN;
    }
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = ys.iter().sum::<f64>() / n;
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &y) in ys.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }
    num / den
}

impl Indicator for Slope {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let mut result = vec![f64::NAN; closes.len()];
        for i in (self.period - 1)..closes.len() {
            let window = &closes[(i + 1 - self.period)..=i];
            let close = closes[i];
            if close == 0.0 || window.iter().any(|v| !v.is_finite()) {
                continue;
            }
            result[i] = least_squares_slope(window) / close * 100.0;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn ols_of_line() {
        assert_approx(least_squares_slope(&[1.0, 3.0, 5.0, 7.0]), 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn normalised_by_current_close() {
        // +1 per bar, last close 100 => 1%
        let closes: Vec<f64> = (91..=100).map(f64::from).collect();
        let s = Slope::new(10).compute(&make_bars(&closes));
        assert!(s[8].is_nan());
        assert_approx(s[9], 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn flat_is_zero() {
        let s = Slope::new(5).compute(&make_bars(&[50.0; 6]));
        assert_approx(s[5], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn zero_close_is_undefined() {
        let s = Slope::new(2).compute(&make_bars(&[1.0, 0.0]));
        assert!(s[1].is_nan());
    }
}
