//! Stop prices.
//!
//! # Formulas
//! ```text
//! protective = shifted_high(w) - k x ATR
//! user       = entry x (1 - tolerated_loss)
//! trailing   = max(entry, swing_high) x (1 - trailing_fraction)
//! ```

/// Chandelier-style protective stop. `None` if either input is undefined.
pub fn protective_stop(shifted_high: f64, atr: f64, multiple: f64) -> Option<f64> {
    let stop = shifted_high - multiple * atr;
    stop.is_finite().then_some(stop)
}

/// Hard stop from the entry price; `None` when not held.
pub fn user_stop(entry: f64, tolerated_loss: f64) -> Option<f64> {
    (entry > 0.0).then(|| entry * (1.0 - tolerated_loss))
}

/// Trailing stop, only while the position is held and in profit.
pub fn trailing_stop(entry: f64, close: f64, swing_high: f64, fraction: f64) -> Option<f64> {
    if entry <= 0.0 || close <= entry {
        return None;
    }
    let anchor = if swing_high.is_finite() {
        swing_high.max(entry)
    } else {
        entry
    };
    Some(anchor * (1.0 - fraction))
}
