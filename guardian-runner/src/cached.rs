//! Read-through caching and pacing around any provider.
//!
//! Cache hits return immediately. Misses wait on the shared [`Pacer`] before
//! reaching the inner provider, so a sequential scan never bursts requests
//! at a remote source.

use crate::cache::{Lookup, TtlCache};
use crate::pacing::Pacer;
use crate::provider::{DataError, DataSource, MarketDataProvider};
use chrono::NaiveDate;
use guardian_core::domain::{
    BarSeries, ChipFlowStatus, MacroContext, QuarterlyReport, SecurityProfile,
};
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::trace;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

pub struct CachedProvider<P> {
    inner: P,
    pacer: Pacer,
    history: TtlCache<(String, u32), Option<BarSeries>>,
    profiles: TtlCache<String, Option<SecurityProfile>>,
    statements: TtlCache<String, Option<Vec<QuarterlyReport>>>,
    flows: TtlCache<(String, NaiveDate), Option<ChipFlowStatus>>,
    macro_context: TtlCache<(), Option<MacroContext>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<P: MarketDataProvider> CachedProvider<P> {
    pub fn new(inner: P, ttl: Duration, pacer: Pacer) -> Self {
        Self {
            inner,
            pacer,
            history: TtlCache::new(ttl),
            profiles: TtlCache::new(ttl),
            statements: TtlCache::new(ttl),
            flows: TtlCache::new(ttl),
            macro_context: TtlCache::new(ttl),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn through<K, V>(
        &self,
        cache: &TtlCache<K, Option<V>>,
        key: K,
        what: &str,
        fetch: impl FnOnce(&P) -> Result<Option<V>, DataError>,
    ) -> Result<Option<V>, DataError>
    where
        K: Eq + Hash + Clone + std::fmt::Debug,
        V: Clone,
    {
        let (value, lookup) = cache.get_or_try_insert_with(&key, || {
            self.pacer.wait();
            fetch(&self.inner)
        })?;
        let counter = match lookup {
            Lookup::Hit => &self.hits,
            Lookup::Miss => &self.misses,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        trace!(what, ?key, ?lookup, "cache lookup");
        Ok((*value).clone())
    }
}

impl<P: MarketDataProvider> MarketDataProvider for CachedProvider<P> {
    fn source(&self) -> DataSource {
        self.inner.source()
    }

    fn history(&self, ticker: &str, lookback_days: u32) -> Result<Option<BarSeries>, DataError> {
        self.through(
            &self.history,
            (ticker.to_string(), lookback_days),
            "history",
            |p| p.history(ticker, lookback_days),
        )
    }

    fn profile(&self, ticker: &str) -> Result<Option<SecurityProfile>, DataError> {
        self.through(&self.profiles, ticker.to_string(), "profile", |p| {
            p.profile(ticker)
        })
    }

    fn quarterly_statements(
        &self,
        ticker: &str,
    ) -> Result<Option<Vec<QuarterlyReport>>, DataError> {
        self.through(&self.statements, ticker.to_string(), "statements", |p| {
            p.quarterly_statements(ticker)
        })
    }

    fn institutional_flow(
        &self,
        ticker: &str,
        date: NaiveDate,
    ) -> Result<Option<ChipFlowStatus>, DataError> {
        self.through(&self.flows, (ticker.to_string(), date), "flow", |p| {
            p.institutional_flow(ticker, date)
        })
    }

    fn macro_snapshot(&self) -> Result<Option<MacroContext>, DataError> {
        self.through(&self.macro_context, (), "macro", |p| p.macro_snapshot())
    }
}
