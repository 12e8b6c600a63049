//! Guardian Runner: data access and watchlist scanning around the scoring engine.
//!
//! This crate builds on `guardian-core` to provide:
//! - The `MarketDataProvider` trait with Yahoo, CSV-directory and synthetic sources
//! - A TTL cache and request pacer wrapped around any provider
//! - TOML watchlists and a pull-based, rankable scan
//! - Parallel batch scoring and BLAKE3 dataset fingerprints

pub mod cache;
pub mod cached;
pub mod circuit_breaker;
pub mod csv_source;
pub mod pacing;
pub mod provider;
pub mod scan;
pub mod synthetic;
pub mod watchlist;
pub mod yahoo;

pub use cache::TtlCache;
pub use cached::{CacheStats, CachedProvider};
pub use circuit_breaker::CircuitBreaker;
pub use csv_source::CsvProvider;
pub use pacing::Pacer;
pub use provider::{DataError, DataSource, MarketDataProvider};
pub use scan::{
    dataset_fingerprint, evaluate_batch, rank, Recommendation, ScanItem, ScanOptions,
    ScanOutcome, ScanRow, Scanner, SecurityInputs, VwapRelation,
};
pub use synthetic::SyntheticProvider;
pub use watchlist::{WatchEntry, WatchGroup, Watchlist, WatchlistError};
pub use yahoo::YahooProvider;
