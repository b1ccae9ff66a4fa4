//! Finnhub history provider.
//!
//! Daily candles from the `/stock/candle` endpoint. The response is columnar:
//! parallel `t` (Unix seconds) and `c` (close) arrays plus a status `s`.
//!
//! Finnhub free tier is limited to 60 API calls per minute.
//! API documentation: https://finnhub.io/docs/api

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::{HistoryWindow, Market, PricePoint, Ticker, TimeSeries};
use crate::provider::http::{self, DEFAULT_TIMEOUT};
use crate::provider::{HistoryProvider, ProviderCapabilities, RateLimit};

const BASE_URL: &str = "https://finnhub.io/api/v1";
const PROVIDER_ID: &str = "FINNHUB";

/// Response from /stock/candle endpoint
#[derive(Debug, Deserialize)]
struct CandleResponse {
    /// Status: "ok" or "no_data"
    s: String,
    /// Close prices
    #[serde(default)]
    c: Vec<Option<f64>>,
    /// Timestamps (Unix)
    #[serde(default)]
    t: Vec<i64>,
}

/// Finnhub history provider.
///
/// Equities only; Shanghai listings are not served on the candle endpoint.
pub struct FinnhubProvider {
    client: reqwest::Client,
    api_key: String,
}

impl FinnhubProvider {
    /// Create a new Finnhub provider with the given API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: http::build_client(DEFAULT_TIMEOUT),
            api_key,
        }
    }

    /// Turn a candle payload into a series.
    fn parse_candles(body: &str) -> Result<TimeSeries, MarketDataError> {
        let response: CandleResponse = http::parse_json(PROVIDER_ID, body)?;

        if response.s == "no_data" {
            return Err(MarketDataError::NoDataForRange);
        }

        if response.s != "ok" {
            return Err(MarketDataError::malformed(
                PROVIDER_ID,
                format!("unexpected candle status: {}", response.s),
            ));
        }

        if response.c.len() != response.t.len() {
            return Err(MarketDataError::malformed(
                PROVIDER_ID,
                "mismatched array lengths in candle response",
            ));
        }

        let mut points = Vec::with_capacity(response.t.len());
        for (idx, (ts, close)) in response.t.iter().zip(response.c.iter()).enumerate() {
            let Some(date) = http::date_from_epoch(*ts) else {
                warn!("Invalid timestamp at index {}: {}", idx, ts);
                continue;
            };
            if let Some(point) = close.and_then(|c| PricePoint::from_f64(date, c)) {
                points.push(point);
            }
        }

        Ok(TimeSeries::from_points(points))
    }
}

#[async_trait]
impl HistoryProvider for FinnhubProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        3
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            markets: Vec::new(),
            excluded_markets: vec![
                Market::Cn,
                Market::Crypto,
                Market::Fx,
                Market::Commodity,
                Market::Index,
            ],
        }
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 60,
            burst: 5,
            min_delay: std::time::Duration::from_millis(100),
            cool_down: std::time::Duration::ZERO,
        }
    }

    fn supports(&self, ticker: &Ticker) -> bool {
        // Shanghai listings are refused whatever their registry tag says.
        let shanghai = ticker
            .suffix()
            .is_some_and(|s| s.eq_ignore_ascii_case("SS"));
        !shanghai && self.capabilities().serves(&ticker.market())
    }

    async fn fetch_history(
        &self,
        ticker: &Ticker,
        window: &HistoryWindow,
    ) -> Result<TimeSeries, MarketDataError> {
        let url = format!("{}/stock/candle", BASE_URL);
        let from_ts = window.start_timestamp().to_string();
        let to_ts = window.end_timestamp().to_string();

        debug!("Finnhub candles for {} from={} to={}", ticker, from_ts, to_ts);

        let request = self
            .client
            .get(&url)
            .header("X-Finnhub-Token", &self.api_key)
            .query(&[
                ("symbol", ticker.symbol.as_str()),
                ("resolution", "D"),
                ("from", from_ts.as_str()),
                ("to", to_ts.as_str()),
            ]);

        let body = http::get_text(PROVIDER_ID, request).await?;
        Ok(Self::parse_candles(&body)?.trim_before(window.cutoff()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_candles_sorts_ascending() {
        // 2024-01-03, 2024-01-01, 2024-01-02 (14:30 UTC)
        let body = r#"{"s":"ok","t":[1704292200,1704119400,1704205800],"c":[3.0,1.0,2.0]}"#;
        let series = FinnhubProvider::parse_candles(body).unwrap();

        let dates: Vec<String> = series.iter().map(|p| p.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert_eq!(
            series.close_on(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()),
            Some(dec!(3))
        );
    }

    #[test]
    fn test_parse_candles_no_data() {
        let err = FinnhubProvider::parse_candles(r#"{"s":"no_data"}"#).unwrap_err();
        assert_eq!(err, MarketDataError::NoDataForRange);
    }

    #[test]
    fn test_parse_candles_mismatched_lengths() {
        let body = r#"{"s":"ok","t":[1704119400,1704205800],"c":[1.0]}"#;
        let err = FinnhubProvider::parse_candles(body).unwrap_err();
        assert!(matches!(err, MarketDataError::MalformedPayload { .. }));
    }

    #[test]
    fn test_parse_candles_skips_null_closes() {
        let body = r#"{"s":"ok","t":[1704119400,1704205800],"c":[null,2.5]}"#;
        let series = FinnhubProvider::parse_candles(body).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_supports() {
        let provider = FinnhubProvider::new("test_key".to_string());
        assert!(provider.supports(&Ticker::new("AAPL")));
        assert!(!provider.supports(&Ticker::new("600519.SS")));
        assert!(!provider.supports(&Ticker::with_market("600519.SS", "US")));
        assert!(!provider.supports(&Ticker::with_market("BTC-USD", "CRYPTO")));
        assert!(!provider.supports(&Ticker::new("EURUSD=X")));
    }

    #[test]
    fn test_provider_id() {
        let provider = FinnhubProvider::new("test_key".to_string());
        assert_eq!(provider.id(), "FINNHUB");
    }
}
