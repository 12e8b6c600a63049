//! Yahoo Finance data provider.
//!
//! Fetches daily OHLCV bars and instrument metadata from Yahoo's v8 chart API.
//! Handles rate limiting, retries with exponential backoff, response parsing,
//! exchange-suffix fallback and the circuit breaker.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes. The CSV directory provider is the fallback when Yahoo is down.

use crate::circuit_breaker::CircuitBreaker;
use crate::provider::{DataError, DataSource, MarketDataProvider};
use chrono::{Duration as Days, NaiveDate, Utc};
use guardian_core::domain::{Bar, BarSeries, MacroContext, SecurityProfile};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Listed-exchange suffixes tried in order for bare numeric tickers.
const SUFFIXES: [&str; 2] = [".TW", ".TWO"];

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    instrument_type: Option<String>,
    short_name: Option<String>,
    long_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
    market_index: String,
    volatility_index: String,
}

impl YahooProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            market_index: "^TWII".to_string(),
            volatility_index: "^VIX".to_string(),
        })
    }

    /// Benchmark and volatility index symbols used for the macro snapshot.
    pub fn with_indices(
        mut self,
        market_index: impl Into<String>,
        volatility_index: impl Into<String>,
    ) -> Self {
        self.market_index = market_index.into();
        self.volatility_index = volatility_index.into();
        self
    }

    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end_ts = (end + Days::days(1))
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp();
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d"
        )
    }

    /// Symbols to try for a ticker: bare numeric codes get exchange suffixes,
    /// anything already qualified (or an index) is used as given.
    fn candidates(ticker: &str) -> Vec<String> {
        let ticker = ticker.trim();
        if ticker.contains('.') || ticker.starts_with('^') {
            vec![ticker.to_string()]
        } else {
            SUFFIXES.iter().map(|s| format!("{ticker}{s}")).collect()
        }
    }

    fn window(lookback_days: u32) -> (NaiveDate, NaiveDate) {
        let end = Utc::now().date_naive();
        (end - Days::days(i64::from(lookback_days)), end)
    }

    /// `Ok(None)` when Yahoo does not know the symbol.
    fn parse_response(resp: ChartResponse) -> Result<Option<ChartData>, DataError> {
        let Some(result) = resp.chart.result else {
            return match resp.chart.error {
                Some(err) if err.code == "Not Found" => Ok(None),
                Some(err) => Err(DataError::ResponseFormatChanged(format!(
                    "{}: {}",
                    err.code, err.description
                ))),
                None => Err(DataError::ResponseFormatChanged(
                    "empty result with no error".into(),
                )),
            };
        };
        Ok(result.into_iter().next())
    }

    fn parse_bars(symbol: &str, data: &ChartData) -> Result<Option<BarSeries>, DataError> {
        let Some(timestamps) = data.timestamp.as_ref() else {
            return Ok(None);
        };
        let quote = data
            .indicators
            .quote
            .first()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            // All-null rows are non-trading days.
            if open.is_none()
                && high.is_none()
                && low.is_none()
                && close.is_none()
                && volume.is_none()
            {
                continue;
            }

            bars.push(Bar {
                date,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                volume: volume.unwrap_or(0),
            });
        }

        if bars.is_empty() {
            return Ok(None);
        }
        Ok(Some(BarSeries::from_unsorted(symbol, bars)?))
    }

    /// One chart request with retry and circuit breaker logic.
    fn fetch_chart(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<ChartData>, DataError> {
        let url = Self::chart_url(symbol, start, end);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                std::thread::sleep(self.base_delay * 2u32.pow(attempt - 1));
            }
            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(&url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();
            if status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }
            if status == reqwest::StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(DataError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }
            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                continue;
            }

            let chart: ChartResponse = resp.json().map_err(|e| {
                DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
            })?;
            let data = Self::parse_response(chart)?;
            self.circuit_breaker.record_success();
            return Ok(data);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }

    /// First candidate symbol Yahoo recognises, with its chart.
    fn resolve(
        &self,
        ticker: &str,
        lookback_days: u32,
    ) -> Result<Option<(String, ChartData)>, DataError> {
        let (start, end) = Self::window(lookback_days);
        for symbol in Self::candidates(ticker) {
            match self.fetch_chart(&symbol, start, end)? {
                Some(data) => {
                    debug!(ticker, %symbol, "resolved ticker");
                    return Ok(Some((symbol, data)));
                }
                None => debug!(ticker, %symbol, "symbol not listed"),
            }
        }
        Ok(None)
    }

    fn last_close(&self, symbol: &str) -> Result<Option<f64>, DataError> {
        Ok(self
            .history(symbol, 10)?
            .map(|s| s.last().close)
            .filter(|c| c.is_finite()))
    }
}

fn profile_from_meta(meta: &ChartMeta) -> SecurityProfile {
    let mut short_name = meta
        .short_name
        .clone()
        .or_else(|| meta.long_name.clone())
        .unwrap_or_default();
    let is_etf = meta
        .instrument_type
        .as_deref()
        .is_some_and(|t| t.eq_ignore_ascii_case("ETF"));
    if is_etf && !short_name.contains("ETF") {
        short_name = format!("{short_name} ETF").trim_start().to_string();
    }
    SecurityProfile {
        short_name,
        summary: meta.long_name.clone().unwrap_or_default(),
        ..SecurityProfile::default()
    }
}

impl MarketDataProvider for YahooProvider {
    fn source(&self) -> DataSource {
        DataSource::YahooFinance
    }

    fn history(&self, ticker: &str, lookback_days: u32) -> Result<Option<BarSeries>, DataError> {
        match self.resolve(ticker, lookback_days)? {
            // Series keep the caller's ticker so reports match the watchlist.
            Some((_, data)) => Self::parse_bars(ticker, &data),
            None => Ok(None),
        }
    }

    fn profile(&self, ticker: &str) -> Result<Option<SecurityProfile>, DataError> {
        Ok(self
            .resolve(ticker, 7)?
            .and_then(|(_, data)| data.meta)
            .map(|meta| profile_from_meta(&meta)))
    }

    fn macro_snapshot(&self) -> Result<Option<MacroContext>, DataError> {
        let Some(index) = self.history(&self.market_index, 400)? else {
            warn!(index = %self.market_index, "market index unavailable");
            return Ok(None);
        };
        let vix = match self.last_close(&self.volatility_index) {
            Ok(v) => v,
            Err(e) => {
                warn!(index = %self.volatility_index, error = %e, "volatility index unavailable");
                None
            }
        };
        Ok(MacroContext::from_index_bars(&index, vix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"instrumentType": "ETF", "shortName": "YUANTA TAIWAN 50"},
                "timestamp": [1704157200, 1704243600, 1704330000],
                "indicators": {"quote": [{
                    "open":   [100.0, null, 102.0],
                    "high":   [101.0, null, 103.5],
                    "low":    [99.0,  null, 101.0],
                    "close":  [100.5, null, 103.0],
                    "volume": [1200,  null, 900]
                }]}
            }],
            "error": null
        }
    }"#;

    fn sample() -> ChartData {
        let resp: ChartResponse = serde_json::from_str(SAMPLE).unwrap();
        YahooProvider::parse_response(resp).unwrap().unwrap()
    }

    #[test]
    fn parses_bars_and_skips_holidays() {
        let series = YahooProvider::parse_bars("0050", &sample()).unwrap().unwrap();
        assert_eq!(series.symbol(), "0050");
        assert_eq!(series.len(), 2);
        assert_eq!(series.last().close, 103.0);
        assert_eq!(series.last().volume, 900);
    }

    #[test]
    fn etf_metadata_marks_short_name() {
        let meta = sample().meta.unwrap();
        let profile = profile_from_meta(&meta);
        assert_eq!(profile.short_name, "YUANTA TAIWAN 50 ETF");
    }

    #[test]
    fn not_found_is_absent() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        let resp: ChartResponse = serde_json::from_str(body).unwrap();
        assert!(YahooProvider::parse_response(resp).unwrap().is_none());
    }

    #[test]
    fn other_chart_errors_fail() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"x"}}}"#;
        let resp: ChartResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(
            YahooProvider::parse_response(resp),
            Err(DataError::ResponseFormatChanged(_))
        ));
    }

    #[test]
    fn suffix_candidates() {
        assert_eq!(YahooProvider::candidates("2330"), vec!["2330.TW", "2330.TWO"]);
        assert_eq!(YahooProvider::candidates("6488.TWO"), vec!["6488.TWO"]);
        assert_eq!(YahooProvider::candidates("^VIX"), vec!["^VIX"]);
    }
}
