//! Reward/risk ratio.

/// Expected reward over risk to the protective stop.
///
/// Risk is `close - stop`, floored at `epsilon` so a breached stop never
/// yields a negative or infinite ratio. Reward is the distance to
/// `swing_high`, or `atr_multiple x ATR` once price is at or above it.
/// Always finite and non-negative.
pub fn reward_risk(
    close: f64,
    protective_stop: f64,
    swing_high: Option<f64>,
    atr: f64,
    atr_multiple: f64,
    epsilon: f64,
) -> f64 {
    let risk = close - protective_stop;
    let risk = if risk.is_finite() && risk > epsilon {
        risk
    } else {
        epsilon
    };
    let reward = match swing_high {
        Some(high) if high > close => high - close,
        _ => atr_multiple * atr,
    };
    let ratio = reward / risk;
    if ratio.is_finite() && ratio > 0.0 {
        ratio
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_swing_high() {
        // reward 10, risk 5
        assert!((reward_risk(100.0, 95.0, Some(110.0), 2.0, 2.0, 0.01) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn at_new_high_uses_atr() {
        // reward 2 x 2.5, risk 5
        assert!((reward_risk(100.0, 95.0, Some(100.0), 2.5, 2.0, 0.01) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn breached_stop_uses_epsilon() {
        let rr = reward_risk(90.0, 95.0, Some(100.0), 2.0, 2.0, 0.01);
        assert!((rr - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn undefined_inputs_give_zero() {
        assert_eq!(reward_risk(100.0, 95.0, None, f64::NAN, 2.0, 0.01), 0.0);
    }
}
