//! Look-ahead contamination tests.
//!
//! No indicator value at bar t may depend on bars t+1 or later.
//!
//! Method: compute on a truncated series (bars 0..100) and the full series
//! (bars 0..200); values for bars 0..100 must agree.

use chrono::NaiveDate;
use guardian_core::domain::{Bar, BarSeries};
use guardian_core::indicators::*;

/// Deterministic pseudo-random walk.
fn make_test_bars(n: usize) -> Vec<Bar> {
    let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let change = ((seed % 200) as f64 - 100.0) * 0.05;
        price = (price + change).max(10.0);

        let open = price - 0.5;
        let close = price + 0.3;
        bars.push(Bar {
            date: base_date + chrono::Duration::days(i as i64),
            open,
            high: open.max(close) + 2.0,
            low: open.min(close) - 2.0,
            close,
            volume: 1000 + (i as u64 * 100),
        });
    }
    bars
}

fn assert_series_prefix(name: &str, truncated: &[f64], full: &[f64]) {
    for (i, (&t, &f)) in truncated.iter().zip(full).enumerate() {
        if t.is_nan() && f.is_nan() {
            continue;
        }
        assert!(
            !t.is_nan() && !f.is_nan(),
            "{name}: NaN mismatch at bar {i} (truncated={t}, full={f})"
        );
        assert!(
            (t - f).abs() < 1e-9,
            "{name}: look-ahead contamination at bar {i}: truncated={t}, full={f}"
        );
    }
}

fn assert_no_lookahead(indicator: &dyn Indicator, full_bars: &[Bar], truncated_len: usize) {
    let truncated = indicator.compute(&full_bars[..truncated_len]);
    let full = indicator.compute(full_bars);
    assert_eq!(truncated.len(), truncated_len, "{}: length", indicator.name());
    assert_eq!(full.len(), full_bars.len(), "{}: length", indicator.name());
    assert_series_prefix(indicator.name(), &truncated, &full[..truncated_len]);
}

#[test]
fn lookahead_moving_averages() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Sma::new(20), &bars, 100);
    assert_no_lookahead(&Sma::new(60), &bars, 100);
}

#[test]
fn lookahead_oscillators() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Rsi::new(14), &bars, 100);
    assert_no_lookahead(&StochasticK::new(9), &bars, 100);
}

#[test]
fn lookahead_atr() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Atr::new(14), &bars, 100);
}

#[test]
fn lookahead_extremes() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&RollingHigh::shifted(20), &bars, 100);
    assert_no_lookahead(&RollingHigh::new(60), &bars, 100);
    assert_no_lookahead(&RollingLow::new(20), &bars, 100);
}

#[test]
fn lookahead_volume_flow() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Vwap::new(20), &bars, 100);
    assert_no_lookahead(&Obv::new(), &bars, 100);
}

#[test]
fn lookahead_slope_position_volatility() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Slope::new(10), &bars, 100);
    assert_no_lookahead(&PricePosition::new(500), &bars, 100);
    assert_no_lookahead(&PricePosition::new(50), &bars, 100);
    assert_no_lookahead(&Volatility::new(20), &bars, 100);
}

#[test]
fn lookahead_full_frame() {
    let bars = make_test_bars(200);
    let params = IndicatorParams::default();
    let full = IndicatorFrame::compute_unchecked(&bars, &params);
    let truncated = IndicatorFrame::compute_unchecked(&bars[..100], &params);

    let pairs: [(&str, &[f64], &[f64]); 18] = [
        ("ma_short", &truncated.ma_short, &full.ma_short),
        ("ma_long", &truncated.ma_long, &full.ma_long),
        ("bias", &truncated.bias, &full.bias),
        ("rsi", &truncated.rsi, &full.rsi),
        ("stoch_k", &truncated.stoch_k, &full.stoch_k),
        ("atr", &truncated.atr, &full.atr),
        ("high_shifted", &truncated.high_shifted, &full.high_shifted),
        ("protective_stop", &truncated.protective_stop, &full.protective_stop),
        ("vwap", &truncated.vwap, &full.vwap),
        ("obv", &truncated.obv, &full.obv),
        ("obv_ma", &truncated.obv_ma, &full.obv_ma),
        ("position", &truncated.position, &full.position),
        ("slope_pct", &truncated.slope_pct, &full.slope_pct),
        ("swing_high", &truncated.swing_high, &full.swing_high),
        ("volume_short", &truncated.volume_short, &full.volume_short),
        ("volume_long", &truncated.volume_long, &full.volume_long),
        ("change_pct", &truncated.change_pct, &full.change_pct),
        ("volatility", &truncated.volatility, &full.volatility),
    ];
    for (name, t, f) in pairs {
        assert_series_prefix(name, t, &f[..100]);
    }
}

#[test]
fn protective_stop_ignores_the_current_bar() {
    // a spike on the last bar must not raise that bar's stop
    let mut bars = make_test_bars(120);
    let params = IndicatorParams::default();
    let before = IndicatorFrame::compute_unchecked(&bars, &params).high_shifted[119];
    bars[119].high += 1000.0;
    let after = IndicatorFrame::compute_unchecked(&bars, &params).high_shifted[119];
    assert_eq!(before, after);
}

#[test]
fn series_truncation_matches_slice() {
    let series = BarSeries::new("TEST", make_test_bars(150)).unwrap();
    let cut = series.truncated(100).unwrap();
    assert_eq!(cut.bars(), &series.bars()[..100]);
}
