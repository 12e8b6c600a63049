//! Volatility-based position sizing.
//!
//! # Formula
//! ```text
//! stop_distance = atr_multiple x ATR
//! shares        = floor(risk_budget / stop_distance / lot_size) x lot_size
//! ```
//!
//! # Example
//! - Risk budget: 5,000
//! - ATR: 2.5, multiple 2 (stop distance 5.0)
//! - Shares: 5,000 / 5.0 = 1,000

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSize {
    pub shares: u64,
    /// Whole board lots contained in `shares`.
    pub board_lots: u64,
    pub board_lot: u64,
}

/// `None` when the budget or volatility cannot size a position.
pub fn position_size(
    risk_budget: f64,
    atr: f64,
    atr_multiple: f64,
    lot_size: u64,
    board_lot: u64,
) -> Option<PositionSize> {
    let stop_distance = atr_multiple * atr;
    if !(risk_budget > 0.0 && stop_distance > 0.0 && stop_distance.is_finite()) {
        return None;
    }
    let lot = lot_size.max(1);
    let raw = (risk_budget / stop_distance).floor();
    if !raw.is_finite() {
        return None;
    }
    let shares = (raw as u64 / lot) * lot;
    Some(PositionSize {
        shares,
        board_lots: shares / board_lot.max(1),
        board_lot: board_lot.max(1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_over_two_atr() {
        let size = position_size(5000.0, 2.5, 2.0, 1, 1000).unwrap();
        assert_eq!(size.shares, 1000);
        assert_eq!(size.board_lots, 1);
    }

    #[test]
    fn floored_to_lot_size() {
        let size = position_size(5000.0, 3.0, 2.0, 100, 1000).unwrap();
        // 833.33 -> 800
        assert_eq!(size.shares, 800);
        assert_eq!(size.board_lots, 0);
    }

    #[test]
    fn zero_atr_cannot_size() {
        assert_eq!(position_size(5000.0, 0.0, 2.0, 1, 1000), None);
        assert_eq!(position_size(0.0, 2.0, 2.0, 1, 1000), None);
        assert_eq!(position_size(5000.0, f64::NAN, 2.0, 1, 1000), None);
    }
}
