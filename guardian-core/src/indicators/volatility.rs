//! Realised volatility: sample standard deviation of daily % returns.

use super::rolling::pct_change;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Volatility {
    period: usize,
    name: String,
}

impl Volatility {
    pub fn new(period: usize) -> Self {
        assert!(period >= 2, "volatility period must be >= 2");
        Self {
            period,
            name: format!("volatility_{period}"),
        }
    }
}

impl Indicator for Volatility {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let returns = pct_change(&closes, 1);
        let mut result = vec![f64::NAN; closes.len()];
        for i in self.period..returns.len() {
            let window = &returns[(i + 1 - self.period)..=i];
            if window.iter().any(|r| r.is_nan()) {
                continue;
            }
            let n = window.len() as f64;
            let mean = window.iter().sum::<f64>() / n;
            let var = window.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
            result[i] = var.sqrt();
        }
        result
    }
}
