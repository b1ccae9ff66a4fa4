//! Stooq history provider.
//!
//! Keyless CSV download (`/q/d/l/?s={symbol}&i=d`) with columns
//! `Date,Open,High,Low,Close,Volume`. Only US listings are reachable, via the
//! `.us` suffix. The full history comes back and is trimmed to the window.

use std::time::Duration;

use async_trait::async_trait;
use csv::ReaderBuilder;
use log::debug;
use reqwest::Client;

use crate::errors::MarketDataError;
use crate::models::{HistoryWindow, Market, PricePoint, Ticker, TimeSeries};
use crate::provider::http::{self, DEFAULT_TIMEOUT};
use crate::provider::{HistoryProvider, ProviderCapabilities, RateLimit};

const BASE_URL: &str = "https://stooq.com/q/d/l/";
const PROVIDER_ID: &str = "STOOQ";

/// Body Stooq serves instead of CSV once the daily quota is used up.
const QUOTA_MARKER: &str = "Exceeded the daily hits limit";

/// Stooq CSV provider.
pub struct StooqProvider {
    client: Client,
}

impl StooqProvider {
    pub fn new() -> Self {
        Self {
            client: http::build_client(DEFAULT_TIMEOUT),
        }
    }

    /// Stooq code for a ticker: bare symbols get `.us`, `.us` is kept,
    /// anything else is not served.
    fn stooq_symbol(ticker: &Ticker) -> Option<String> {
        let symbol = ticker.symbol.to_ascii_lowercase();
        match ticker.suffix() {
            None => Some(format!("{}.us", symbol)),
            Some(suffix) if suffix.eq_ignore_ascii_case("us") => Some(symbol),
            Some(_) => None,
        }
    }

    fn parse_csv(body: &str) -> Result<TimeSeries, MarketDataError> {
        if body.contains(QUOTA_MARKER) {
            return Err(MarketDataError::quota_exhausted(PROVIDER_ID, QUOTA_MARKER));
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(body.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| MarketDataError::malformed(PROVIDER_ID, e.to_string()))?
            .clone();

        let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let (Some(date_idx), Some(close_idx)) = (column("date"), column("close")) else {
            // "No data" is served as a one-line body without a header row.
            return Err(MarketDataError::NoDataForRange);
        };

        let mut points = Vec::new();
        for record in reader.records() {
            let record =
                record.map_err(|e| MarketDataError::malformed(PROVIDER_ID, e.to_string()))?;
            let date = record.get(date_idx).and_then(http::date_from_str);
            let close = record.get(close_idx).and_then(http::close_from_str);
            if let (Some(date), Some(close)) = (date, close) {
                points.push(PricePoint::new(date, close));
            }
        }

        Ok(TimeSeries::from_points(points))
    }
}

impl Default for StooqProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryProvider for StooqProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        5
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
            requests_per_minute: 30,
            burst: 2,
            min_delay: Duration::from_millis(250),
            cool_down: Duration::ZERO,
        }
    }

    fn supports(&self, ticker: &Ticker) -> bool {
        Self::stooq_symbol(ticker).is_some() && self.capabilities().serves(&ticker.market())
    }

    async fn fetch_history(
        &self,
        ticker: &Ticker,
        window: &HistoryWindow,
    ) -> Result<TimeSeries, MarketDataError> {
        let symbol = Self::stooq_symbol(ticker).ok_or_else(|| MarketDataError::Unsupported {
            provider: PROVIDER_ID.to_string(),
            symbol: ticker.symbol.clone(),
        })?;

        debug!("Stooq CSV for {} as {}", ticker, symbol);

        let request = self
            .client
            .get(BASE_URL)
            .query(&[("s", symbol.as_str()), ("i", "d")]);

        let body = http::get_text(PROVIDER_ID, request).await?;
        Ok(Self::parse_csv(&body)?.trim_before(window.cutoff()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_csv_sorts_ascending() {
        let body = "Date,Open,High,Low,Close,Volume\n\
                    2024-01-03,1,1,1,184.25,100\n\
                    2024-01-01,1,1,1,185.00,100\n\
                    2024-01-02,1,1,1,185.64,100\n";
        let series = StooqProvider::parse_csv(body).unwrap();

        let dates: Vec<String> = series.iter().map(|p| p.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert_eq!(
            series.close_on(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()),
            Some(dec!(185.64))
        );
    }

    #[test]
    fn test_parse_csv_no_data() {
        assert_eq!(
            StooqProvider::parse_csv("No data").unwrap_err(),
            MarketDataError::NoDataForRange
        );
    }

    #[test]
    fn test_parse_csv_quota() {
        let err = StooqProvider::parse_csv("Exceeded the daily hits limit").unwrap_err();
        assert!(matches!(err, MarketDataError::QuotaExhausted { .. }));
        assert_eq!(err.retry_class(), crate::errors::RetryClass::NextProvider);
    }

    #[test]
    fn test_stooq_symbol() {
        assert_eq!(StooqProvider::stooq_symbol(&Ticker::new("AAPL")).as_deref(), Some("aapl.us"));
        assert_eq!(
            StooqProvider::stooq_symbol(&Ticker::new("MSFT.US")).as_deref(),
            Some("msft.us")
        );
        assert_eq!(StooqProvider::stooq_symbol(&Ticker::new("600519.SS")), None);
    }

    #[test]
    fn test_supports() {
        let provider = StooqProvider::new();
        assert!(provider.supports(&Ticker::new("AAPL")));
        assert!(!provider.supports(&Ticker::new("VOD.L")));
        assert!(!provider.supports(&Ticker::with_market("BTC", "CRYPTO")));
    }
}
