//! Guardian Core: the decision scoring engine.
//!
//! Given daily bars (and optionally quarterly financials, institutional flow
//! and a macro context) for one security, derives:
//! - causal technical indicators
//! - a regime classification that selects the trend or cycle branch
//! - fundamental, chip-flow and technical sub-scores
//! - a composite score and action under a weighting policy with hard vetoes
//! - protective, user and trailing stops, reward/risk and a position size
//!
//! The engine never fetches, caches or mutates its inputs.

pub mod classify;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod evaluators;
pub mod indicators;
pub mod report;
pub mod risk;
pub mod scoring;
pub mod seasonality;

pub use config::{ConfigError, EngineConfig, PositionContext};
pub use engine::{Engine, EvaluationInputs};
pub use error::EngineError;
pub use report::{Evaluation, ScoreReport};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types shared with worker threads are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::BarSeries>();
        require_sync::<domain::BarSeries>();
        require_send::<domain::MacroContext>();
        require_sync::<domain::MacroContext>();
        require_send::<domain::FinancialSnapshot>();
        require_sync::<domain::FinancialSnapshot>();
        require_send::<Engine>();
        require_sync::<Engine>();
        require_send::<EngineConfig>();
        require_sync::<EngineConfig>();
        require_send::<Evaluation>();
        require_sync::<Evaluation>();
        require_send::<indicators::IndicatorFrame>();
        require_sync::<indicators::IndicatorFrame>();
    }
}
