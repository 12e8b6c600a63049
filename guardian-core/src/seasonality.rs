//! Calendar-month seasonality of daily returns.

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::domain::Bar;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonalityConfig {
    /// Minimum history (about one trading year).
    pub min_bars: usize,
}

impl Default for SeasonalityConfig {
    fn default() -> Self {
        Self { min_bars: 250 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthStat {
    /// 1 = January.
    pub month: u32,
    pub mean_change_pct: f64,
    /// Share of up days, in percent.
    pub win_rate_pct: f64,
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySeasonality {
    /// Months with at least one sample, in calendar order.
    pub months: Vec<MonthStat>,
}

impl MonthlySeasonality {
    /// `None` below `config.min_bars` bars.
    pub fn compute(bars: &[Bar], config: &SeasonalityConfig) -> Option<Self> {
        if bars.len() < config.min_bars {
            return None;
        }
        let mut sums = [0.0f64; 12];
        let mut wins = [0usize; 12];
        let mut counts = [0usize; 12];
        for pair in bars.windows(2) {
            let (prev, bar) = (pair[0].close, pair[1].close);
            if !(prev.is_finite() && bar.is_finite()) || prev == 0.0 {
                continue;
            }
            let change = (bar / prev - 1.0) * 100.0;
            let m = pair[1].date.month0() as usize;
            sums[m] += change;
            counts[m] += 1;
            if change > 0.0 {
                wins[m] += 1;
            }
        }
        let months = (0..12)
            .filter(|&m| counts[m] > 0)
            .map(|m| MonthStat {
                month: m as u32 + 1,
                mean_change_pct: sums[m] / counts[m] as f64,
                win_rate_pct: wins[m] as f64 / counts[m] as f64 * 100.0,
                samples: counts[m],
            })
            .collect();
        Some(Self { months })
    }

    pub fn month(&self, month: u32) -> Option<&MonthStat> {
        self.months.iter().find(|s| s.month == month)
    }

    /// Month with the highest mean change.
    pub fn best(&self) -> Option<&MonthStat> {
        self.months
            .iter()
            .max_by(|a, b| a.mean_change_pct.total_cmp(&b.mean_change_pct))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bars_from(start: NaiveDate, closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                date: start + chrono::Duration::days(i as i64),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1,
            })
            .collect()
    }

    #[test]
    fn needs_a_year_of_history() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = bars_from(start, &[100.0; 100]);
        assert!(MonthlySeasonality::compute(&bars, &SeasonalityConfig::default()).is_none());
    }

    #[test]
    fn monthly_means_and_win_rates() {
        // January rises 1% a day, February falls
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut closes = Vec::new();
        let mut c = 100.0;
        for day in 0..60 {
            closes.push(c);
            c *= if day < 30 { 1.01 } else { 0.99 };
        }
        let bars = bars_from(start, &closes);
        let s = MonthlySeasonality::compute(&bars, &SeasonalityConfig { min_bars: 10 }).unwrap();
        let jan = s.month(1).unwrap();
        assert!((jan.mean_change_pct - 1.0).abs() < 1e-9);
        assert_eq!(jan.win_rate_pct, 100.0);
        assert_eq!(jan.samples, 30);
        let feb = s.month(2).unwrap();
        assert!(feb.mean_change_pct < 0.0);
        assert_eq!(s.best().map(|m| m.month), Some(1));
    }
}
