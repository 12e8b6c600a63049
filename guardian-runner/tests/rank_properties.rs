//! Property tests for scan ranking.
//!
//! 1. Ranked rows are ordered best first by normalised score
//! 2. Rows with equal scores keep their watchlist order
//! 3. Ranking is a permutation of the input rows

use guardian_core::classify::Branch;
use guardian_core::scoring::Action;
use guardian_runner::{rank, DataSource, Recommendation, ScanRow, VwapRelation};
use proptest::prelude::*;

fn row(position: usize, normalized_score: f64) -> ScanRow {
    ScanRow {
        group: "g".into(),
        name: format!("row {position}"),
        ticker: position.to_string(),
        close: 100.0,
        branch: Branch::Trend,
        score: normalized_score * 100.0,
        normalized_score,
        action: Action::Hold,
        recommendation: Recommendation::Watch,
        reward_risk: 1.0,
        vwap_relation: VwapRelation::Unknown,
        protective_stop: 95.0,
        source: DataSource::Synthetic,
        fingerprint: String::new(),
    }
}

// A few coarse score levels so ties are common.
fn arb_rows() -> impl Strategy<Value = Vec<ScanRow>> {
    prop::collection::vec(-4i32..=4, 0..40).prop_map(|levels| {
        levels
            .into_iter()
            .enumerate()
            .map(|(i, level)| row(i, f64::from(level) / 4.0))
            .collect()
    })
}

proptest! {
    #[test]
    fn rank_orders_best_first_and_keeps_ties(rows in arb_rows()) {
        let mut ranked = rows.clone();
        rank(&mut ranked);

        prop_assert_eq!(ranked.len(), rows.len());
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].normalized_score >= pair[1].normalized_score);
            if pair[0].normalized_score == pair[1].normalized_score {
                let a: usize = pair[0].ticker.parse().unwrap();
                let b: usize = pair[1].ticker.parse().unwrap();
                prop_assert!(a < b, "tie reordered: {} before {}", a, b);
            }
        }

        let mut tickers: Vec<usize> = ranked.iter().map(|r| r.ticker.parse().unwrap()).collect();
        tickers.sort_unstable();
        prop_assert_eq!(tickers, (0..rows.len()).collect::<Vec<_>>());
    }

    #[test]
    fn rank_is_idempotent(rows in arb_rows()) {
        let mut once = rows;
        rank(&mut once);
        let mut twice = once.clone();
        rank(&mut twice);
        prop_assert_eq!(once, twice);
    }
}
