//! Yahoo proxy worker history provider.
//!
//! A self-hosted edge worker that fronts the Yahoo chart API and returns a
//! flat JSON list of bars: `[{"date": ..., "close": ...}, ...]`. Dates come
//! as ISO strings or epoch seconds, closes as `close` or `c`.
//!
//! Endpoint: `{base_url}/history/{symbol}?range=1y&interval=1d`, optionally
//! authenticated with an `X-Worker-Token` header.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;

use crate::errors::MarketDataError;
use crate::models::{HistoryWindow, PricePoint, Ticker, TimeSeries};
use crate::provider::http::{self, DEFAULT_TIMEOUT};
use crate::provider::yahoo::chart_symbol;
use crate::provider::{HistoryProvider, ProviderCapabilities, RateLimit};

const PROVIDER_ID: &str = "YAHOO_WORKER";

const COOL_DOWN: Duration = Duration::from_secs(1);

/// Connection settings for the worker.
#[derive(Clone, Debug, Default)]
pub struct YahooWorkerConfig {
    pub base_url: String,
    pub token: Option<String>,
    /// Fixed range label (`1y`, `5y`, ...) overriding the window's.
    pub range: Option<String>,
}

/// Yahoo proxy worker provider.
pub struct YahooWorkerProvider {
    client: Client,
    config: YahooWorkerConfig,
}

impl YahooWorkerProvider {
    pub fn new(config: YahooWorkerConfig) -> Self {
        Self {
            client: http::build_client(DEFAULT_TIMEOUT),
            config,
        }
    }

    fn history_url(&self, symbol: &str) -> String {
        format!(
            "{}/history/{}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(symbol)
        )
    }

    fn parse_records(body: &str) -> Result<TimeSeries, MarketDataError> {
        let payload: Value = http::parse_json(PROVIDER_ID, body)?;

        let Value::Array(records) = payload else {
            return Err(MarketDataError::malformed(
                PROVIDER_ID,
                "expected a JSON list of bars",
            ));
        };

        let points = records.iter().filter_map(|record| {
            let record = record.as_object()?;
            let date = record.get("date").and_then(http::date_from_value)?;
            let close = record
                .get("close")
                .or_else(|| record.get("c"))
                .and_then(http::close_from_value)?;
            Some(PricePoint::new(date, close))
        });

        Ok(TimeSeries::from_points(points))
    }
}

#[async_trait]
impl HistoryProvider for YahooWorkerProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        1
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::open()
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 60,
            burst: 2,
            min_delay: Duration::from_millis(250),
            cool_down: COOL_DOWN,
        }
    }

    async fn fetch_history(
        &self,
        ticker: &Ticker,
        window: &HistoryWindow,
    ) -> Result<TimeSeries, MarketDataError> {
        let symbol = chart_symbol(ticker);
        let url = self.history_url(&symbol);
        let range = self
            .config
            .range
            .as_deref()
            .unwrap_or_else(|| window.range_label());

        debug!("Yahoo worker GET {} range={}", url, range);

        let mut request = self
            .client
            .get(&url)
            .query(&[("range", range), ("interval", "1d")]);
        if let Some(token) = &self.config.token {
            request = request.header("X-Worker-Token", token);
        }

        let body = match http::get_text(PROVIDER_ID, request).await {
            Ok(body) => body,
            Err(MarketDataError::UpstreamRejected { status: 404, .. }) => {
                return Err(MarketDataError::NoDataForRange)
            }
            Err(err) => return Err(err),
        };

        Ok(Self::parse_records(&body)?.trim_before(window.cutoff()))
    }
}
