//! Yahoo Finance data provider.
//!
//! Fetches OHLCV bars from Yahoo's v8 chart API and returns them in the
//! provider's native column naming (`Open`, `High`, `Low`, `Close`,
//! `Volume`, `Adj Close`). One request per call, no retries.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.

use super::provider::{DataError, MarketDataProvider};
use crate::series::{Column, PriceSeries};
use chrono::NaiveDate;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

/// Intervals the chart endpoint accepts.
pub const SUPPORTED_INTERVALS: &[&str] = &[
    "1m", "2m", "5m", "15m", "30m", "60m", "90m", "1h", "1d", "5d", "1wk", "1mo", "3mo",
];

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";

/// Yahoo Finance v8 chart API response.
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
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the provider at a different host (mirrors, local test servers).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Build the chart API URL for a symbol, date range and interval.
    ///
    /// `end` is exclusive: the range stops at midnight UTC of that day. The
    /// symbol is a single percent-encoded path segment.
    fn chart_url(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: &str,
    ) -> Result<Url, DataError> {
        let invalid = |reason: String| DataError::InvalidOption {
            key: "base_url".into(),
            reason,
        };
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| invalid(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| invalid(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        url.query_pairs_mut()
            .append_pair("period1", &midnight_utc(start).to_string())
            .append_pair("period2", &midnight_utc(end).to_string())
            .append_pair("interval", interval)
            .append_pair("includeAdjustedClose", "true");
        Ok(url)
    }

    /// Parse the chart API response into a native-schema series.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<PriceSeries, DataError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }
                } else {
                    DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
                }
            } else {
                DataError::ResponseFormatChanged("empty result with no error".into())
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        // A valid symbol with no bars in range comes back without timestamps.
        let timestamps = data.timestamp.unwrap_or_default();

        let quote = data.indicators.quote.into_iter().next().unwrap_or_default();

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let n = timestamps.len();
        let mut dates = Vec::with_capacity(n);
        let mut open = Vec::with_capacity(n);
        let mut high = Vec::with_capacity(n);
        let mut low = Vec::with_capacity(n);
        let mut close = Vec::with_capacity(n);
        let mut volume = Vec::with_capacity(n);
        let mut adj_close = Vec::with_capacity(n);

        let cell = |v: &Vec<Option<f64>>, i: usize| v.get(i).copied().flatten();

        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let o = cell(&quote.open, i);
            let h = cell(&quote.high, i);
            let l = cell(&quote.low, i);
            let c = cell(&quote.close, i);
            let v = cell(&quote.volume, i);

            // Skip bars where all OHLCV are None (holidays/non-trading days)
            if o.is_none() && h.is_none() && l.is_none() && c.is_none() && v.is_none() {
                continue;
            }

            dates.push(date);
            open.push(o);
            high.push(h);
            low.push(l);
            close.push(c);
            volume.push(v);
            adj_close.push(adj_closes.as_ref().and_then(|a| cell(a, i)));
        }

        let mut columns = vec![
            Column::numeric("Open", open),
            Column::numeric("High", high),
            Column::numeric("Low", low),
            Column::numeric("Close", close),
            Column::numeric("Volume", volume),
        ];
        if adj_closes.is_some() {
            columns.push(Column::numeric("Adj Close", adj_close));
        }

        PriceSeries::with_dates(dates, columns)
    }
}

fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: &str,
    ) -> Result<PriceSeries, DataError> {
        if !SUPPORTED_INTERVALS.contains(&interval) {
            return Err(DataError::InvalidInterval(interval.to_string()));
        }

        let url = self.chart_url(symbol, start, end, interval)?;
        tracing::debug!(symbol, %url, "requesting chart");

        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        if !status.is_success() {
            return Err(DataError::Http {
                symbol: symbol.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp
            .bytes()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;
        let chart: ChartResponse = serde_json::from_slice(&body).map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })?;

        Self::parse_response(symbol, chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "chart": {
            "result": [{
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {
                    "quote": [{
                        "open":   [187.15, null, 184.22],
                        "high":   [188.44, null, 185.88],
                        "low":    [183.89, null, 183.43],
                        "close":  [185.64, null, 184.25],
                        "volume": [82488700, null, 58414500]
                    }],
                    "adjclose": [{ "adjclose": [184.94, null, 183.56] }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parse_response_drops_empty_bars_and_keeps_native_names() {
        let resp: ChartResponse = serde_json::from_str(SAMPLE).unwrap();
        let series = YahooProvider::parse_response("AAPL", resp).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(
            series.column_names(),
            vec!["Open", "High", "Low", "Close", "Volume", "Adj Close"]
        );
        assert_eq!(series.numeric("Close").unwrap(), &[Some(185.64), Some(184.25)]);
        assert_eq!(
            series.dates().unwrap()[0].unwrap().date(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
    }

    #[test]
    fn parse_response_maps_not_found() {
        let resp: ChartResponse = serde_json::from_str(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#,
        )
        .unwrap();
        let err = YahooProvider::parse_response("ZZZZ", resp).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { symbol } if symbol == "ZZZZ"));
    }

    #[test]
    fn parse_response_without_bars_is_empty_series() {
        let resp: ChartResponse = serde_json::from_str(
            r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#,
        )
        .unwrap();
        let series = YahooProvider::parse_response("SPY", resp).unwrap();
        assert!(series.is_empty());
        assert!(series.has_column("Open"));
        assert!(!series.has_column("Adj Close"));
    }

    #[test]
    fn chart_url_uses_exclusive_end_and_interval() {
        let provider = YahooProvider::with_base_url("http://localhost:9/").unwrap();
        let url = provider
            .chart_url(
                "MSFT",
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                "1wk",
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9/v8/finance/chart/MSFT?period1=1704067200&period2=1704153600&interval=1wk&includeAdjustedClose=true"
        );
    }

    #[test]
    fn chart_url_encodes_reserved_characters_in_symbol() {
        let provider = YahooProvider::with_base_url("http://localhost:9").unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let url = provider.chart_url("A/B?x=1&y#z", day, day, "1d").unwrap();

        assert_eq!(
            url.path(),
            "/v8/finance/chart/A%2FB%3Fx=1&y%23z"
        );
        assert_eq!(url.fragment(), None);
        let keys: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        assert_eq!(
            keys,
            vec!["period1", "period2", "interval", "includeAdjustedClose"]
        );
    }

    #[test]
    fn chart_url_rejects_malformed_base() {
        let provider = YahooProvider::with_base_url("not a url").unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let err = provider.chart_url("SPY", day, day, "1d").unwrap_err();
        assert!(matches!(err, DataError::InvalidOption { ref key, .. } if key == "base_url"));
    }

    #[test]
    fn unsupported_interval_fails_before_any_request() {
        let provider = YahooProvider::with_base_url("http://localhost:9").unwrap();
        let err = provider
            .fetch_history(
                "MSFT",
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                "7d",
            )
            .unwrap_err();
        assert!(matches!(err, DataError::InvalidInterval(i) if i == "7d"));
    }
}
