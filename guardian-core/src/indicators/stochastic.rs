//! Stochastic oscillator %K.
//!
//! %K = 100 x (close - lowest_low) / (highest_high - lowest_low) over `period`
//! bars including the current one. A zero high-low range is undefined.

use super::rolling::{rolling_max, rolling_min};
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct StochasticK {
    period: usize,
    name: String,
}

impl StochasticK {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "stochastic period must be >= 1");
        Self {
            period,
            name: format!("stoch_k_{period}"),
        }
    }
}

impl Indicator for StochasticK {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let hh = rolling_max(&highs, self.period, 0);
        let ll = rolling_min(&lows, self.period, 0);

        bars.iter()
            .enumerate()
            .map(|(i, bar)| {
                let range = hh[i] - ll[i];
                if range > 0.0 {
                    (100.0 * (bar.close - ll[i]) / range).clamp(0.0, 100.0)
                } else {
                    f64::NAN
                }
            })
            .collect()
    }
}
