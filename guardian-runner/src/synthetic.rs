//! Deterministic synthetic market data for development and demos.
//!
//! Each ticker gets its own random walk seeded from BLAKE3(seed, ticker), so
//! the same ticker always produces the same bars regardless of request order.
//! Results built on synthetic data are labelled by [`DataSource::Synthetic`].

use crate::provider::{DataError, DataSource, MarketDataProvider};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use guardian_core::domain::{
    Bar, BarSeries, ChipFlow, ChipFlowStatus, MacroContext, MarketRegime, QuarterlyReport,
    SecurityProfile,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    seed: u64,
    end: NaiveDate,
}

impl SyntheticProvider {
    /// Walks end on `end`, so output does not depend on the wall clock.
    pub fn new(seed: u64, end: NaiveDate) -> Self {
        Self { seed, end }
    }

    fn rng(&self, ticker: &str, stream: &str) -> StdRng {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(ticker.as_bytes());
        hasher.update(stream.as_bytes());
        StdRng::from_seed(*hasher.finalize().as_bytes())
    }

    fn walk(&self, ticker: &str, lookback_days: u32) -> Vec<Bar> {
        let mut rng = self.rng(ticker, "bars");
        let start = self.end - Duration::days(i64::from(lookback_days));
        let mut price: f64 = rng.gen_range(20.0..400.0);
        let drift: f64 = rng.gen_range(-0.001..0.0015);

        let mut bars = Vec::new();
        let mut current = start;
        while current <= self.end {
            if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                current += Duration::days(1);
                continue;
            }
            let daily_return: f64 = drift + rng.gen_range(-0.025..0.025);
            let open = price;
            let close = (price * (1.0 + daily_return)).max(1.0);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            bars.push(Bar {
                date: current,
                open,
                high,
                low,
                close,
                volume: rng.gen_range(500_000..5_000_000u64),
            });
            price = close;
            current += Duration::days(1);
        }
        bars
    }
}

impl MarketDataProvider for SyntheticProvider {
    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn history(&self, ticker: &str, lookback_days: u32) -> Result<Option<BarSeries>, DataError> {
        let bars = self.walk(ticker, lookback_days);
        if bars.is_empty() {
            return Ok(None);
        }
        Ok(Some(BarSeries::new(ticker, bars)?))
    }

    fn profile(&self, ticker: &str) -> Result<Option<SecurityProfile>, DataError> {
        Ok(Some(SecurityProfile::named(format!("Synthetic {ticker}"))))
    }

    fn quarterly_statements(
        &self,
        ticker: &str,
    ) -> Result<Option<Vec<QuarterlyReport>>, DataError> {
        let mut rng = self.rng(ticker, "financials");
        let latest_date = self.end - Duration::days(rng.gen_range(10..80));
        let prior_eps: f64 = rng.gen_range(-1.0..4.0);
        let report = |report_date: NaiveDate, eps: f64, rng: &mut StdRng| QuarterlyReport {
            report_date,
            eps,
            gross_margin: rng.gen_range(0.1..0.6),
            inventory: rng.gen_range(100.0..1_000.0),
            cost_of_revenue: rng.gen_range(1_000.0..5_000.0),
            roe: Some(rng.gen_range(-5.0..30.0)),
        };
        let latest_eps = prior_eps + rng.gen_range(-1.0..1.5);
        let latest = report(latest_date, latest_eps, &mut rng);
        let prior = report(latest_date - Duration::days(91), prior_eps, &mut rng);
        Ok(Some(vec![latest, prior]))
    }

    fn institutional_flow(
        &self,
        ticker: &str,
        date: NaiveDate,
    ) -> Result<Option<ChipFlowStatus>, DataError> {
        let mut rng = self.rng(ticker, &date.to_string());
        Ok(Some(ChipFlowStatus::Available(ChipFlow {
            date,
            foreign_net: rng.gen_range(-5_000_000..5_000_000),
            trust_net: rng.gen_range(-500_000..500_000),
        })))
    }

    fn macro_snapshot(&self) -> Result<Option<MacroContext>, DataError> {
        Ok(Some(MacroContext {
            regime: MarketRegime::Bull,
            volatility_index: Some(18.0),
            as_of: Some(self.end),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(seed: u64) -> SyntheticProvider {
        SyntheticProvider::new(seed, NaiveDate::from_ymd_opt(2024, 6, 28).unwrap())
    }

    #[test]
    fn same_ticker_same_bars() {
        let a = provider(7).history("2330", 400).unwrap().unwrap();
        let b = provider(7).history("2330", 400).unwrap().unwrap();
        assert_eq!(a.bars(), b.bars());
    }

    #[test]
    fn tickers_and_seeds_differ() {
        let a = provider(7).history("2330", 100).unwrap().unwrap();
        let b = provider(7).history("2454", 100).unwrap().unwrap();
        let c = provider(8).history("2330", 100).unwrap().unwrap();
        assert_ne!(a.bars(), b.bars());
        assert_ne!(a.bars(), c.bars());
    }

    #[test]
    fn bars_are_sane_weekdays() {
        let series = provider(1).history("2603", 400).unwrap().unwrap();
        assert!(series.len() > 250);
        for bar in series.bars() {
            assert!(bar.is_sane(), "{bar:?}");
            assert!(!matches!(bar.date.weekday(), Weekday::Sat | Weekday::Sun));
        }
    }

    #[test]
    fn financials_are_ordered_latest_first() {
        let reports = provider(3).quarterly_statements("2330").unwrap().unwrap();
        assert!(reports[0].report_date > reports[1].report_date);
    }
}
