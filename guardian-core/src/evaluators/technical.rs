//! Technical evaluator.
//!
//! Scores price structure, stop breaches, oscillator extremes, bias, slope
//! and VWAP into points in [-100, 100], plus a multiplicative gate in
//! [0.1, 1] that the gated composite policy applies to its base score.
//!
//! Structure is branch-specific: the trend branch reads the moving-average
//! stack, the cycle branch reads the position within the long-run range.

use serde::{Deserialize, Serialize};

use crate::classify::Branch;
use crate::indicators::IndicatorFrame;
use crate::report::{Evidence, Source};
use crate::scoring::SubScore;

pub const TECHNICAL_MAX: f64 = 100.0;
const GATE_FLOOR: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalConfig {
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    /// Position above which the range is "high".
    pub position_high: f64,
    /// Position below which the range is "low".
    pub position_low: f64,
    /// |bias| (%) beyond which price is stretched from the short MA.
    pub bias_stretch: f64,
    pub slope_strong: f64,
    pub slope_falling: f64,
    /// Trend branch: positive slope below this is fading momentum.
    pub slope_fading: f64,
}

impl Default for TechnicalConfig {
    fn default() -> Self {
        Self {
            rsi_overbought: 80.0,
            rsi_oversold: 20.0,
            position_high: 0.8,
            position_low: 0.2,
            bias_stretch: 12.0,
            slope_strong: 0.4,
            slope_falling: -0.2,
            slope_fading: 0.1,
        }
    }
}

/// Closes below the protective stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopBreach {
    None,
    /// Latest close only: a warning.
    Single,
    /// Two consecutive closes: trend reversal.
    Confirmed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TechnicalOutcome {
    pub score: SubScore,
    pub gate: f64,
    pub protective_stop: f64,
    pub breach: StopBreach,
    pub evidence: Evidence,
}

/// Running tally of points, gate and evidence.
struct Tally {
    points: f64,
    gate: f64,
    evidence: Evidence,
}

impl Tally {
    fn add(&mut self, points: f64, title: &str, rationale: String) {
        self.points += points;
        self.evidence.push(Source::Technical, title, rationale);
    }

    fn gate(&mut self, factor: f64) {
        self.gate *= factor;
    }
}

/// Two-session stop rule at bar `i`.
pub fn stop_breach(frame: &IndicatorFrame, i: usize) -> StopBreach {
    let below = |j: usize| {
        frame
            .close_and_stop(j)
            .is_some_and(|(close, stop)| close < stop)
    };
    match (below(i), i.checked_sub(1).is_some_and(below)) {
        (true, true) => StopBreach::Confirmed,
        (true, false) => StopBreach::Single,
        (false, _) => StopBreach::None,
    }
}

/// Evaluate the latest bar of `frame`.
///
/// Returns `None` when close, moving averages or the protective stop are
/// undefined at the latest bar.
pub fn evaluate_technical(
    frame: &IndicatorFrame,
    branch: Branch,
    turnaround: bool,
    config: &TechnicalConfig,
) -> Option<TechnicalOutcome> {
    let i = frame.len().checked_sub(1)?;
    let snap = frame.at(i)?;
    let close = snap.close?;
    let ma_short = snap.ma_short?;
    let ma_long = snap.ma_long?;
    let protective_stop = snap.protective_stop?;

    let mut t = Tally {
        points: 0.0,
        gate: 1.0,
        evidence: Evidence::new(),
    };

    match branch {
        Branch::Trend => trend_structure(&mut t, close, ma_short, ma_long, turnaround),
        Branch::Cycle => cycle_position(&mut t, close, ma_short, snap.position, config),
    }

    let breach = stop_breach(frame, i);
    match breach {
        StopBreach::Confirmed => {
            t.add(
                -40.0,
                "Stop breach confirmed",
                format!("two closes below the protective stop {protective_stop:.2}"),
            );
            t.gate(0.4);
        }
        StopBreach::Single => {
            t.add(
                -15.0,
                "Stop breach warning",
                format!("close {close:.2} below the protective stop {protective_stop:.2}"),
            );
            t.gate(0.85);
        }
        StopBreach::None => {}
    }

    if let Some(rsi) = snap.rsi {
        if rsi > config.rsi_overbought {
            t.add(-15.0, "RSI overbought", format!("RSI {rsi:.1}"));
            if let Some(pos) = snap.position.filter(|p| *p > config.position_high) {
                t.add(
                    -10.0,
                    "Overheated at a high level",
                    format!("RSI {rsi:.1} with position {:.0}%", pos * 100.0),
                );
            }
        } else if rsi < config.rsi_oversold {
            t.add(10.0, "RSI oversold", format!("RSI {rsi:.1}"));
        }
    }

    if let Some(bias) = snap.bias {
        if bias > config.bias_stretch {
            t.add(-15.0, "Overextended", format!("{bias:.1}% above the short MA"));
        } else if bias < -config.bias_stretch {
            t.add(10.0, "Oversold stretch", format!("{:.1}% below the short MA", -bias));
        }
    }

    if let Some(slope) = snap.slope_pct {
        if slope > config.slope_strong {
            t.add(10.0, "Strong momentum", format!("slope {slope:.2}% per bar"));
        } else if slope < config.slope_falling {
            t.add(-20.0, "Falling knife", format!("slope {slope:.2}% per bar"));
        } else if branch == Branch::Trend && slope > 0.0 && slope < config.slope_fading {
            t.add(-5.0, "Momentum fading", format!("slope {slope:.2}% per bar"));
        }
    }

    if let Some(vwap) = snap.vwap {
        if close > vwap {
            t.add(5.0, "Above holder cost", format!("close above VWAP {vwap:.2}"));
        } else {
            t.add(-10.0, "Below holder cost", format!("close at or below VWAP {vwap:.2}"));
        }
    }

    Some(TechnicalOutcome {
        score: SubScore::new(t.points, -TECHNICAL_MAX, TECHNICAL_MAX),
        gate: t.gate.clamp(GATE_FLOOR, 1.0),
        protective_stop,
        breach,
        evidence: t.evidence,
    })
}

fn trend_structure(t: &mut Tally, close: f64, ma_short: f64, ma_long: f64, turnaround: bool) {
    if close > ma_long {
        if close > ma_short {
            t.add(25.0, "Bullish structure", "close above both moving averages".into());
        } else if close < ma_short {
            t.add(-10.0, "Short-term weakness", "above the long MA, below the short MA".into());
        }
    } else if close < ma_long {
        if turnaround {
            t.add(
                0.0,
                "Structure tolerated",
                "below the long MA, excused by an earnings turnaround".into(),
            );
        } else {
            t.add(-25.0, "Bearish structure", "close below the long MA".into());
            t.gate(0.7);
        }
    }
}

fn cycle_position(
    t: &mut Tally,
    close: f64,
    ma_short: f64,
    position: Option<f64>,
    config: &TechnicalConfig,
) {
    let Some(pos) = position else {
        return;
    };
    let pct = pos * 100.0;
    if pos < config.position_low {
        if close > ma_short {
            t.add(40.0, "Cycle low, turning up", format!("position {pct:.0}%, above the short MA"));
        } else {
            t.add(25.0, "Cycle low", format!("position {pct:.0}% of the long-run range"));
        }
    } else if pos > config.position_high {
        if close < ma_short {
            t.add(-40.0, "Cycle high, rolling over", format!("position {pct:.0}%, below the short MA"));
        } else {
            t.add(-25.0, "Cycle high", format!("position {pct:.0}% of the long-run range"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use crate::indicators::{make_bars, make_ohlcv, IndicatorParams};

    fn frame(bars: &[Bar]) -> IndicatorFrame {
        IndicatorFrame::compute_unchecked(bars, &IndicatorParams::default())
    }

    fn flat(n: usize) -> Vec<(f64, f64, f64, f64, u64)> {
        (0..n).map(|_| (100.0, 100.0, 98.0, 100.0, 1000)).collect()
    }

    #[test]
    fn flat_market_is_mildly_positive() {
        let out = evaluate_technical(
            &frame(&make_ohlcv(&flat(120))),
            Branch::Trend,
            false,
            &TechnicalConfig::default(),
        )
        .unwrap();
        // only the VWAP check fires: typical price 99.33 < close
        assert_eq!(out.score.points, 5.0);
        assert_eq!(out.gate, 1.0);
        assert_eq!(out.breach, StopBreach::None);
        assert!((out.protective_stop - 96.0).abs() < 1e-9);
    }

    #[test]
    fn second_close_below_stop_costs_more() {
        let mut one = flat(120);
        one[119] = (95.0, 95.0, 94.0, 94.0, 1000);
        let mut two = flat(120);
        two[118] = (95.0, 95.0, 94.0, 94.0, 1000);
        two[119] = (94.0, 95.0, 94.0, 94.0, 1000);

        let cfg = TechnicalConfig::default();
        let single = evaluate_technical(&frame(&make_ohlcv(&one)), Branch::Trend, false, &cfg).unwrap();
        let double = evaluate_technical(&frame(&make_ohlcv(&two)), Branch::Trend, false, &cfg).unwrap();
        assert_eq!(single.breach, StopBreach::Single);
        assert_eq!(double.breach, StopBreach::Confirmed);
        assert!(double.score.points < single.score.points);
        assert!(double.gate < single.gate);
    }

    #[test]
    fn turnaround_tolerates_bearish_structure() {
        let closes: Vec<f64> = (0..120).map(|i| 200.0 - i as f64 * 0.5).collect();
        let f = frame(&make_bars(&closes));
        let cfg = TechnicalConfig::default();
        let plain = evaluate_technical(&f, Branch::Trend, false, &cfg).unwrap();
        let excused = evaluate_technical(&f, Branch::Trend, true, &cfg).unwrap();
        assert!(excused.score.points > plain.score.points);
        assert!(excused.gate > plain.gate);
        assert!(excused.evidence.iter().any(|e| e.title == "Structure tolerated"));
    }

    #[test]
    fn cycle_branch_rewards_low_position() {
        // long decline then a small bounce: low in the range, above the short MA
        let mut closes: Vec<f64> = (0..100).map(|i| 200.0 - i as f64).collect();
        closes.extend((0..20).map(|i| 101.0 + i as f64 * 0.4));
        let out = evaluate_technical(
            &frame(&make_bars(&closes)),
            Branch::Cycle,
            false,
            &TechnicalConfig::default(),
        )
        .unwrap();
        assert!(out.evidence.iter().any(|e| e.title == "Cycle low, turning up"));
        assert!(!out.evidence.iter().any(|e| e.title.contains("structure")));
    }

    #[test]
    fn undefined_inputs_yield_none() {
        let short = frame(&make_bars(&[100.0; 30]));
        assert!(evaluate_technical(&short, Branch::Trend, false, &TechnicalConfig::default()).is_none());
    }

    #[test]
    fn gate_never_below_floor() {
        let closes: Vec<f64> = (0..120)
            .map(|i| if i < 110 { 100.0 } else { 60.0 - i as f64 })
            .collect();
        let out = evaluate_technical(
            &frame(&make_bars(&closes)),
            Branch::Trend,
            false,
            &TechnicalConfig::default(),
        )
        .unwrap();
        assert!(out.gate >= GATE_FLOOR);
        assert!(out.score.points >= -TECHNICAL_MAX);
    }
}
