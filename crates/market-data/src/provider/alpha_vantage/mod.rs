//! Alpha Vantage history provider.
//!
//! Uses `TIME_SERIES_DAILY_ADJUSTED` with `outputsize=full` and trims the
//! result to the requested window. Throttling is reported in-band: a `Note`
//! means the per-minute frequency was exceeded, an `Information` message
//! means the daily quota or plan does not cover the call.
//!
//! Note: Alpha Vantage free tier is limited to 5 API calls per minute.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::{HistoryWindow, Market, PricePoint, Ticker, TimeSeries};
use crate::provider::http;
use crate::provider::{HistoryProvider, ProviderCapabilities, RateLimit};

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER_ID: &str = "ALPHA_VANTAGE";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Pause after a successful call; the free tier allows 5 calls a minute.
const COOL_DOWN: Duration = Duration::from_secs(12);

/// TIME_SERIES_DAILY_ADJUSTED response
#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<HashMap<String, DailyBar>>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DailyBar {
    #[serde(rename = "4. close")]
    close: Option<String>,
    #[serde(rename = "5. adjusted close")]
    adjusted_close: Option<String>,
}

/// Alpha Vantage history provider.
pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
}

impl AlphaVantageProvider {
    /// Create a new Alpha Vantage provider with the given API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: http::build_client(REQUEST_TIMEOUT),
            api_key,
        }
    }

    fn parse_daily(body: &str) -> Result<TimeSeries, MarketDataError> {
        let response: TimeSeriesResponse = http::parse_json(PROVIDER_ID, body)?;

        if let Some(note) = response.note {
            warn!("Alpha Vantage throttle notice: {}", note);
            return Err(MarketDataError::rate_limited(PROVIDER_ID));
        }

        if let Some(information) = response.information {
            warn!("Alpha Vantage quota notice: {}", information);
            return Err(MarketDataError::quota_exhausted(PROVIDER_ID, information));
        }

        if let Some(message) = response.error_message {
            return Err(MarketDataError::malformed(PROVIDER_ID, message));
        }

        let Some(time_series) = response.time_series else {
            return Err(MarketDataError::malformed(
                PROVIDER_ID,
                "missing \"Time Series (Daily)\"",
            ));
        };

        let points = time_series.into_iter().filter_map(|(date, bar)| {
            let date = http::date_from_str(&date)?;
            let close = bar
                .adjusted_close
                .as_deref()
                .and_then(http::close_from_str)
                .or_else(|| bar.close.as_deref().and_then(http::close_from_str))?;
            Some(PricePoint::new(date, close))
        });

        Ok(TimeSeries::from_points(points))
    }
}

#[async_trait]
impl HistoryProvider for AlphaVantageProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        4
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            markets: Vec::new(),
            excluded_markets: vec![
                Market::Crypto,
                Market::Fx,
                Market::Commodity,
                Market::Index,
            ],
        }
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 5,
            burst: 1,
            min_delay: Duration::from_secs(12),
            cool_down: COOL_DOWN,
        }
    }

    async fn fetch_history(
        &self,
        ticker: &Ticker,
        window: &HistoryWindow,
    ) -> Result<TimeSeries, MarketDataError> {
        debug!("Alpha Vantage daily adjusted for {}", ticker);

        let request = self.client.get(BASE_URL).query(&[
            ("function", "TIME_SERIES_DAILY_ADJUSTED"),
            ("symbol", ticker.symbol.as_str()),
            ("outputsize", "full"),
            ("apikey", self.api_key.as_str()),
        ]);

        let body = http::get_text(PROVIDER_ID, request).await?;
        Ok(Self::parse_daily(&body)?.trim_before(window.cutoff()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_parse_prefers_adjusted_close() {
        let body = r#"{
            "Meta Data": {"2. Symbol": "IBM"},
            "Time Series (Daily)": {
                "2024-01-03": {"1. open": "1", "4. close": "160.10", "5. adjusted close": "158.00"},
                "2024-01-01": {"4. close": "150.00"},
                "2024-01-02": {"4. close": "155.5", "5. adjusted close": "154.25"}
            }
        }"#;
        let series = AlphaVantageProvider::parse_daily(body).unwrap();

        let dates: Vec<String> = series.iter().map(|p| p.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert_eq!(series.close_on(day("2024-01-03")), Some(dec!(158.00)));
        assert_eq!(series.close_on(day("2024-01-01")), Some(dec!(150.00)));
    }

    #[test]
    fn test_note_is_rate_limit() {
        let body = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute"}"#;
        let err = AlphaVantageProvider::parse_daily(body).unwrap_err();
        assert_eq!(err, MarketDataError::rate_limited(PROVIDER_ID));
    }

    #[test]
    fn test_daily_quota_is_not_backed_off() {
        let body = r#"{"Information": "Our standard API rate limit is 25 requests per day."}"#;
        let err = AlphaVantageProvider::parse_daily(body).unwrap_err();
        assert!(matches!(err, MarketDataError::QuotaExhausted { .. }));
        assert_eq!(err.retry_class(), crate::errors::RetryClass::NextProvider);
    }

    #[test]
    fn test_error_message_is_malformed() {
        let body = r#"{"Error Message": "Invalid API call."}"#;
        let err = AlphaVantageProvider::parse_daily(body).unwrap_err();
        assert!(matches!(err, MarketDataError::MalformedPayload { .. }));
    }

    #[test]
    fn test_rate_limit_declares_cool_down() {
        let provider = AlphaVantageProvider::new("test_key".to_string());
        let limit = provider.rate_limit();
        assert_eq!(limit.requests_per_minute, 5);
        assert_eq!(limit.burst, 1);
        assert!(limit.cool_down > Duration::ZERO);
    }

    #[test]
    fn test_supports() {
        let provider = AlphaVantageProvider::new("test_key".to_string());
        assert!(provider.supports(&Ticker::new("IBM")));
        assert!(!provider.supports(&Ticker::new("^GSPC")));
    }
}
