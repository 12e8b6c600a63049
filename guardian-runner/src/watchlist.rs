//! Named groups of securities to scan, loaded from TOML.
//!
//! ```toml
//! [[group]]
//! name = "Shipping and materials"
//! branch = "cycle"
//!
//! [[group.security]]
//! name = "Evergreen Marine"
//! ticker = "2603"
//! ```

use guardian_core::classify::{normalize_identifier, Branch};
use guardian_core::domain::SecurityProfile;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchlistError {
    #[error("cannot read watchlist {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid watchlist TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("watchlist has no securities")]
    Empty,

    #[error("group '{group}': security '{name}' has an empty ticker")]
    EmptyTicker { group: String, name: String },

    #[error("ticker {ticker} listed more than once")]
    DuplicateTicker { ticker: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchEntry {
    pub name: String,
    pub ticker: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl WatchEntry {
    /// Profile from the watchlist's own descriptors.
    pub fn profile_hint(&self) -> SecurityProfile {
        SecurityProfile {
            short_name: self.name.clone(),
            sector: self.sector.clone().unwrap_or_default(),
            industry: String::new(),
            summary: self.summary.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchGroup {
    pub name: String,
    /// Scoring branch forced for every member of the group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<Branch>,
    #[serde(default, rename = "security")]
    pub securities: Vec<WatchEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watchlist {
    #[serde(default, rename = "group")]
    pub groups: Vec<WatchGroup>,
}

impl Watchlist {
    pub fn from_toml_str(text: &str) -> Result<Self, WatchlistError> {
        let list: Watchlist = toml::from_str(text)?;
        list.validate()?;
        Ok(list)
    }

    pub fn load(path: &Path) -> Result<Self, WatchlistError> {
        let text = std::fs::read_to_string(path).map_err(|source| WatchlistError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), WatchlistError> {
        let mut seen = HashSet::new();
        for group in &self.groups {
            for entry in &group.securities {
                let ticker = normalize_identifier(&entry.ticker).to_string();
                if ticker.is_empty() {
                    return Err(WatchlistError::EmptyTicker {
                        group: group.name.clone(),
                        name: entry.name.clone(),
                    });
                }
                if !seen.insert(ticker.clone()) {
                    return Err(WatchlistError::DuplicateTicker { ticker });
                }
            }
        }
        if seen.is_empty() {
            return Err(WatchlistError::Empty);
        }
        Ok(())
    }

    /// Every security with its group, in file order.
    pub fn entries(&self) -> impl Iterator<Item = (&WatchGroup, &WatchEntry)> {
        self.groups
            .iter()
            .flat_map(|g| g.securities.iter().map(move |e| (g, e)))
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.securities.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[group]]
name = "Technology"

[[group.security]]
name = "TSMC"
ticker = "2330"

[[group.security]]
name = "MediaTek"
ticker = "2454"
sector = "Semiconductors"

[[group]]
name = "ETFs"
branch = "trend"

[[group.security]]
name = "Yuanta Taiwan 50"
ticker = "0050"
"#;

    #[test]
    fn parses_groups_in_order() {
        let list = Watchlist::from_toml_str(SAMPLE).unwrap();
        assert_eq!(list.groups.len(), 2);
        assert_eq!(list.len(), 3);
        assert_eq!(list.groups[1].branch, Some(Branch::Trend));
        let tickers: Vec<_> = list.entries().map(|(_, e)| e.ticker.as_str()).collect();
        assert_eq!(tickers, ["2330", "2454", "0050"]);
    }

    #[test]
    fn profile_hint_carries_sector() {
        let list = Watchlist::from_toml_str(SAMPLE).unwrap();
        let (_, mediatek) = list.entries().nth(1).unwrap();
        assert_eq!(mediatek.profile_hint().sector, "Semiconductors");
    }

    #[test]
    fn duplicate_ticker_rejected_across_suffixes() {
        let text = r#"
[[group]]
name = "A"
[[group.security]]
name = "x"
ticker = "2330"
[[group.security]]
name = "y"
ticker = "2330.TW"
"#;
        assert!(matches!(
            Watchlist::from_toml_str(text),
            Err(WatchlistError::DuplicateTicker { .. })
        ));
    }

    #[test]
    fn empty_watchlist_rejected() {
        assert!(matches!(
            Watchlist::from_toml_str(""),
            Err(WatchlistError::Empty)
        ));
    }

    #[test]
    fn round_trips_through_toml() {
        let list = Watchlist::from_toml_str(SAMPLE).unwrap();
        let text = toml::to_string(&list).unwrap();
        assert_eq!(Watchlist::from_toml_str(&text).unwrap(), list);
    }
}
