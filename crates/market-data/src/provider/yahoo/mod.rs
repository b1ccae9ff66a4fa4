//! Yahoo Finance history provider.
//!
//! Reads the public chart v8 endpoint (`/v8/finance/chart/{symbol}`), which
//! needs no key but throttles aggressively. Requests rotate across the
//! `query1`/`query2`/`query3` hosts when one of them errors out.

mod models;

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;

use crate::errors::MarketDataError;
use crate::models::{HistoryWindow, Market, PricePoint, Ticker, TimeSeries};
use crate::provider::http::{self, DEFAULT_TIMEOUT};
use crate::provider::{HistoryProvider, ProviderCapabilities, RateLimit};

use models::YahooChartResponse;

const PROVIDER_ID: &str = "YAHOO";

const HOSTS: [&str; 3] = [
    "query1.finance.yahoo.com",
    "query2.finance.yahoo.com",
    "query3.finance.yahoo.com",
];

const COOL_DOWN: Duration = Duration::from_secs(2);

/// Symbol as Yahoo expects it: FX pairs carry the `=X` suffix.
pub(crate) fn chart_symbol(ticker: &Ticker) -> String {
    if ticker.market() == Market::Fx && !ticker.symbol.ends_with("=X") {
        format!("{}=X", ticker.symbol)
    } else {
        ticker.symbol.clone()
    }
}

/// Yahoo Finance chart provider.
pub struct YahooProvider {
    client: Client,
}

impl YahooProvider {
    pub fn new() -> Self {
        Self {
            client: http::build_client(DEFAULT_TIMEOUT),
        }
    }

    fn parse_chart(body: &str) -> Result<TimeSeries, MarketDataError> {
        let response: YahooChartResponse = http::parse_json(PROVIDER_ID, body)?;

        if let Some(error) = response.chart.error {
            debug!(
                "Yahoo chart error {:?}: {:?}",
                error.code, error.description
            );
            return Err(MarketDataError::NoDataForRange);
        }

        let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
            return Err(MarketDataError::NoDataForRange);
        };

        let closes = result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();

        let points = result
            .timestamp
            .iter()
            .zip(closes)
            .filter_map(|(ts, close)| {
                let date = http::date_from_epoch(*ts)?;
                PricePoint::from_f64(date, close?)
            });

        Ok(TimeSeries::from_points(points))
    }

    /// Host errors worth retrying on a sibling host.
    fn is_host_error(err: &MarketDataError) -> bool {
        match err {
            MarketDataError::NetworkFailure { .. } => true,
            MarketDataError::UpstreamRejected { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryProvider for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        2
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::open()
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 30,
            burst: 2,
            min_delay: Duration::from_millis(500),
            cool_down: COOL_DOWN,
        }
    }

    async fn fetch_history(
        &self,
        ticker: &Ticker,
        window: &HistoryWindow,
    ) -> Result<TimeSeries, MarketDataError> {
        let symbol = chart_symbol(ticker);
        let encoded = urlencoding::encode(&symbol);
        let mut last_error = MarketDataError::NoDataForRange;

        for host in HOSTS {
            let url = format!("https://{}/v8/finance/chart/{}", host, encoded);
            debug!("Yahoo chart GET {} range={}", url, window.range_label());

            let request = self
                .client
                .get(&url)
                .query(&[("range", window.range_label()), ("interval", "1d")]);

            match http::get_text(PROVIDER_ID, request).await {
                Ok(body) => return Ok(Self::parse_chart(&body)?.trim_before(window.cutoff())),
                Err(err) if Self::is_host_error(&err) => {
                    info!("Yahoo host {} failed for {}: {}", host, ticker, err);
                    last_error = err;
                }
                Err(MarketDataError::UpstreamRejected { status: 404, .. }) => {
                    return Err(MarketDataError::NoDataForRange);
                }
                Err(err) => return Err(err),
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chart_sorts_and_skips_nulls() {
        let body = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1704292200, 1704119400, 1704205800, 1704378600],
                    "indicators": {"quote": [{"close": [3.0, 1.0, 2.0, null]}]}
                }],
                "error": null
            }
        }"#;
        let series = YahooProvider::parse_chart(body).unwrap();
        let dates: Vec<String> = series.iter().map(|p| p.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
    }

    #[test]
    fn test_parse_chart_error_is_no_data() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"delisted"}}}"#;
        assert_eq!(
            YahooProvider::parse_chart(body).unwrap_err(),
            MarketDataError::NoDataForRange
        );
    }

    #[test]
    fn test_parse_chart_rejects_non_json() {
        let err = YahooProvider::parse_chart("<html>busy</html>").unwrap_err();
        assert!(matches!(err, MarketDataError::MalformedPayload { .. }));
    }

    #[test]
    fn test_chart_symbol_maps_fx() {
        assert_eq!(chart_symbol(&Ticker::with_market("EURUSD", "FX")), "EURUSD=X");
        assert_eq!(chart_symbol(&Ticker::new("EURUSD=X")), "EURUSD=X");
        assert_eq!(chart_symbol(&Ticker::new("AAPL")), "AAPL");
    }

    #[test]
    fn test_host_errors() {
        assert!(YahooProvider::is_host_error(&MarketDataError::network(
            PROVIDER_ID,
            "reset"
        )));
        assert!(YahooProvider::is_host_error(&MarketDataError::UpstreamRejected {
            provider: PROVIDER_ID.to_string(),
            status: 502,
        }));
        assert!(!YahooProvider::is_host_error(&MarketDataError::rate_limited(PROVIDER_ID)));
    }
}
