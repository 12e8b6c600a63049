//! Rolling high / low extremes.
//!
//! `shifted` variants end the window at the previous bar, so a level used as
//! support for bar t never includes bar t itself.

use super::rolling::{rolling_max, rolling_min};
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct RollingHigh {
    period: usize,
    shift: usize,
    name: String,
}

impl RollingHigh {
    /// Highest high of the last `period` bars including the current one.
    pub fn new(period: usize) -> Self {
        Self::with_shift(period, 0)
    }

    /// Highest high of the `period` bars before the current one.
    pub fn shifted(period: usize) -> Self {
        Self::with_shift(period, 1)
    }

    fn with_shift(period: usize, shift: usize) -> Self {
        assert!(period >= 1, "rolling high period must be >= 1");
        let name = if shift == 0 {
            format!("high_{period}")
        } else {
            format!("high_{period}_prev")
        };
        Self {
            period,
            shift,
            name,
        }
    }
}

impl Indicator for RollingHigh {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1 + self.shift
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        rolling_max(&highs, self.period, self.shift)
    }
}

#[derive(Debug, Clone)]
pub struct RollingLow {
    period: usize,
    name: String,
}

impl RollingLow {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "rolling low period must be >= 1");
        Self {
            period,
            name: format!("low_{period}"),
        }
    }
}

impl Indicator for RollingLow {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
        rolling_min(&lows, self.period, 0)
    }
}
