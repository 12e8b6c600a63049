//! Engine configuration and per-call position inputs.
//!
//! Both are plain serde records with `#[serde(default)]`, so a TOML file
//! only needs the keys it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::{Branch, ClassifierConfig};
use crate::evaluators::{ChipFlowConfig, FundamentalConfig, MacroConfig, TechnicalConfig};
use crate::indicators::IndicatorParams;
use crate::risk::RiskConfig;
use crate::scoring::CompositeConfig;
use crate::seasonality::SeasonalityConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Everything that shapes an evaluation apart from the data and the position.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub indicators: IndicatorParams,
    pub classifier: ClassifierConfig,
    pub fundamental: FundamentalConfig,
    #[serde(rename = "macro")]
    pub macro_overlay: MacroConfig,
    pub chip_flow: ChipFlowConfig,
    pub technical: TechnicalConfig,
    pub composite: CompositeConfig,
    pub risk: RiskConfig,
    pub seasonality: SeasonalityConfig,
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Reject values no evaluation could use meaningfully.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, window) in self.indicators.windows() {
            if window == 0 {
                return Err(invalid(&format!("indicators.{name}"), "window must be >= 1"));
            }
        }
        if self.indicators.slope < 2 {
            return Err(invalid("indicators.slope", "slope needs at least 2 bars"));
        }
        if self.indicators.volatility < 2 {
            return Err(invalid("indicators.volatility", "volatility needs at least 2 returns"));
        }
        if self.indicators.ma_short >= self.indicators.ma_long {
            return Err(invalid(
                "indicators.ma_short",
                "short moving average must be shorter than the long one",
            ));
        }
        if !(self.indicators.stop_atr_multiple > 0.0) {
            return Err(invalid("indicators.stop_atr_multiple", "must be > 0"));
        }

        let w = &self.composite.weights;
        for (name, value) in [
            ("technical", w.technical),
            ("chip_flow", w.chip_flow),
            ("fundamental", w.fundamental),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(invalid(&format!("composite.weights.{name}"), "must be >= 0"));
            }
        }
        if w.technical + w.chip_flow <= 0.0 {
            return Err(invalid(
                "composite.weights",
                "technical and chip-flow weights cannot both be zero",
            ));
        }

        let m = &self.macro_overlay;
        for (name, value) in [
            ("high_volatility_multiplier", m.high_volatility_multiplier),
            ("bear_multiplier", m.bear_multiplier),
            ("unavailable_multiplier", m.unavailable_multiplier),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(invalid(&format!("macro.{name}"), "must be in (0, 1]"));
            }
        }
        if m.catastrophic_volatility < m.high_volatility {
            return Err(invalid(
                "macro.catastrophic_volatility",
                "must not be below high_volatility",
            ));
        }

        if self.fundamental.max_age_days <= 0 {
            return Err(invalid("fundamental.max_age_days", "must be > 0"));
        }
        if !(self.risk.trailing_fraction > 0.0 && self.risk.trailing_fraction < 1.0) {
            return Err(invalid("risk.trailing_fraction", "must be in (0, 1)"));
        }
        if !(self.risk.risk_epsilon > 0.0) {
            return Err(invalid("risk.risk_epsilon", "must be > 0"));
        }
        if !(self.risk.sizing_atr_multiple > 0.0) {
            return Err(invalid("risk.sizing_atr_multiple", "must be > 0"));
        }
        Ok(())
    }
}

/// Caller inputs describing the holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionContext {
    /// Entry price; 0 means not held.
    pub entry_price: f64,
    /// Tolerated loss as a fraction of entry (0.10 = 10%).
    pub tolerated_loss: f64,
    pub trailing_stop: bool,
    /// Currency amount the caller is willing to lose on the position.
    pub risk_budget: f64,
    /// Forces the scoring branch regardless of classification.
    pub branch_override: Option<Branch>,
    pub lot_size: u64,
    pub board_lot: u64,
    pub include_seasonality: bool,
}

impl Default for PositionContext {
    fn default() -> Self {
        Self {
            entry_price: 0.0,
            tolerated_loss: 0.10,
            trailing_stop: false,
            risk_budget: 5000.0,
            branch_override: None,
            lot_size: 1,
            board_lot: 1000,
            include_seasonality: false,
        }
    }
}

impl PositionContext {
    pub fn is_held(&self) -> bool {
        self.entry_price > 0.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.entry_price >= 0.0 && self.entry_price.is_finite()) {
            return Err(invalid("entry_price", "must be >= 0"));
        }
        if !(self.tolerated_loss >= 0.0 && self.tolerated_loss < 1.0) {
            return Err(invalid("tolerated_loss", "must be in [0, 1)"));
        }
        if !(self.risk_budget >= 0.0 && self.risk_budget.is_finite()) {
            return Err(invalid("risk_budget", "must be >= 0"));
        }
        if self.lot_size == 0 || self.board_lot == 0 {
            return Err(invalid("lot_size", "lot sizes must be >= 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::CompositePolicyKind;

    #[test]
    fn default_config_is_valid() {
        EngineConfig::default().validate().unwrap();
        PositionContext::default().validate().unwrap();
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = EngineConfig::from_toml_str(
            r#"
            [indicators]
            ma_short = 10

            [macro]
            high_volatility = 25.0

            [composite]
            cycle_policy = "weighted"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.indicators.ma_short, 10);
        assert_eq!(cfg.indicators.ma_long, 60);
        assert_eq!(cfg.macro_overlay.high_volatility, 25.0);
        assert_eq!(cfg.composite.cycle_policy, CompositePolicyKind::Weighted);
        assert_eq!(cfg.risk, RiskConfig::default());
    }

    #[test]
    fn default_round_trips_through_toml() {
        let text = EngineConfig::default().to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), EngineConfig::default());
    }

    #[test]
    fn rejects_inverted_averages() {
        let err = EngineConfig::from_toml_str("[indicators]\nma_short = 80\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "indicators.ma_short"));
    }

    #[test]
    fn rejects_zero_window() {
        let err = EngineConfig::from_toml_str("[indicators]\natr = 0\n").unwrap_err();
        assert!(err.to_string().contains("indicators.atr"));
    }

    #[test]
    fn rejects_bad_multiplier() {
        assert!(EngineConfig::from_toml_str("[macro]\nbear_multiplier = 1.5\n").is_err());
    }

    #[test]
    fn rejects_bad_position() {
        let position = PositionContext {
            tolerated_loss: 1.5,
            ..PositionContext::default()
        };
        assert!(position.validate().is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EngineConfig::load("/nonexistent/guardian.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
