//! Reference metadata about a security, as supplied by the data layer.

use serde::{Deserialize, Serialize};

/// Free-text descriptors used by the regime classifier.
///
/// Every field is optional in practice; providers fill what they have.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityProfile {
    pub short_name: String,
    pub sector: String,
    pub industry: String,
    pub summary: String,
}

impl SecurityProfile {
    pub fn named(short_name: impl Into<String>) -> Self {
        Self {
            short_name: short_name.into(),
            ..Self::default()
        }
    }

    pub fn is_blank(&self) -> bool {
        self.short_name.is_empty()
            && self.sector.is_empty()
            && self.industry.is_empty()
            && self.summary.is_empty()
    }

    /// Sector, industry and summary joined and lowercased for keyword search.
    pub fn search_text(&self) -> String {
        [
            self.sector.as_str(),
            self.industry.as_str(),
            self.summary.as_str(),
        ]
        .join(" ")
        .to_lowercase()
    }
}
