//! Rolling volume-weighted average of typical price.
//!
//! VWAP[t] = sum(tp x volume) / sum(volume) over `period` bars. A zero volume
//! sum (suspended or illiquid stretch) is undefined.

use super::rolling::rolling_sum;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Vwap {
    period: usize,
    name: String,
}

impl Vwap {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "VWAP period must be >= 1");
        Self {
            period,
            name: format!("vwap_{period}"),
        }
    }
}

impl Indicator for Vwap {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let weighted: Vec<f64> = bars
            .iter()
            .map(|b| b.typical_price() * b.volume as f64)
            .collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();
        let num = rolling_sum(&weighted, self.period);
        let den = rolling_sum(&volumes, self.period);
        num.iter()
            .zip(&den)
            .map(|(&n, &d)| if d > 0.0 { n / d } else { f64::NAN })
            .collect()
    }
}
