//! Alltick history provider for mainland China A-shares.
//!
//! The kline endpoint is not pinned down: a configured URL is tried first,
//! then the known public endpoints, each with both interval spellings
//! (`1day`, `1d`). Payloads vary too; the bar list may be the body itself or
//! sit under `data`, `kline`, `values` or `result`, and bars are either
//! objects or `[ts, open, high, low, close, ...]` arrays.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::{HistoryWindow, Market, PricePoint, Ticker, TimeSeries};
use crate::provider::http;
use crate::provider::{HistoryProvider, ProviderCapabilities, RateLimit};

const PROVIDER_ID: &str = "ALLTICK";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(25);

const BUILTIN_ENDPOINTS: [&str; 2] = [
    "https://api.alltick.co/market/kline",
    "https://api.alltick.co/kline",
];

const INTERVALS: [&str; 2] = ["1day", "1d"];

const BAR_LIMIT: &str = "5000";

const LIST_KEYS: [&str; 4] = ["data", "kline", "values", "result"];
const DATE_KEYS: [&str; 4] = ["datetime", "time", "t", "date"];
const CLOSE_KEYS: [&str; 4] = ["close", "c", "last", "price"];

/// Alltick provider settings.
#[derive(Clone, Debug, Default)]
pub struct AlltickConfig {
    pub api_key: String,
    /// Endpoint tried before the built-in ones.
    pub history_url: Option<String>,
}

/// Alltick kline provider.
pub struct AlltickProvider {
    client: Client,
    config: AlltickConfig,
}

impl AlltickProvider {
    pub fn new(config: AlltickConfig) -> Self {
        Self {
            client: http::build_client(REQUEST_TIMEOUT),
            config,
        }
    }

    fn endpoints(&self) -> Vec<&str> {
        self.config
            .history_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .into_iter()
            .chain(BUILTIN_ENDPOINTS)
            .collect()
    }

    /// Locate the bar list; `None` when the payload has no recognizable list.
    fn bar_list(payload: &Value) -> Option<&Vec<Value>> {
        match payload {
            Value::Array(bars) => Some(bars),
            Value::Object(map) => LIST_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_array)),
            _ => None,
        }
    }

    fn first_of<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
        keys.iter()
            .filter_map(|key| map.get(*key))
            .find(|v| !v.is_null())
    }

    fn parse_bar(bar: &Value) -> Option<PricePoint> {
        let (date, close) = match bar {
            Value::Object(map) => (
                Self::first_of(map, &DATE_KEYS)?,
                Self::first_of(map, &CLOSE_KEYS)?,
            ),
            Value::Array(fields) => (fields.first()?, fields.get(4)?),
            _ => return None,
        };
        Some(PricePoint::new(
            http::date_from_value(date)?,
            http::close_from_value(close)?,
        ))
    }

    /// Parse one endpoint's body; `Ok(None)` means "try the next endpoint".
    fn parse_payload(body: &str) -> Result<Option<TimeSeries>, MarketDataError> {
        let payload: Value = http::parse_json(PROVIDER_ID, body)?;
        Ok(Self::bar_list(&payload)
            .map(|bars| bars.iter().filter_map(Self::parse_bar).collect::<TimeSeries>()))
    }
}

#[async_trait]
impl HistoryProvider for AlltickProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        7
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            markets: vec![Market::Cn],
            excluded_markets: Vec::new(),
        }
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 10,
            burst: 1,
            min_delay: Duration::from_secs(1),
            cool_down: Duration::ZERO,
        }
    }

    async fn fetch_history(
        &self,
        ticker: &Ticker,
        window: &HistoryWindow,
    ) -> Result<TimeSeries, MarketDataError> {
        let code = ticker.base_symbol();
        let mut last_error = MarketDataError::NoDataForRange;

        for endpoint in self.endpoints() {
            for interval in INTERVALS {
                debug!(
                    "Alltick GET {} symbol={} interval={}",
                    endpoint, code, interval
                );

                let request = self.client.get(endpoint).query(&[
                    ("symbol", code),
                    ("interval", interval),
                    ("limit", BAR_LIMIT),
                    ("apikey", self.config.api_key.as_str()),
                ]);

                let parsed = match http::get_text(PROVIDER_ID, request).await {
                    Ok(body) => Self::parse_payload(&body),
                    Err(err) => Err(err),
                };

                match parsed {
                    Ok(Some(series)) => return Ok(series.trim_before(window.cutoff())),
                    Ok(None) => {
                        debug!("Alltick {} returned no bar list for {}", endpoint, code);
                    }
                    Err(err @ MarketDataError::RateLimited { .. }) => return Err(err),
                    Err(err) => {
                        warn!("Alltick {} failed for {}: {}", endpoint, ticker, err);
                        last_error = err;
                    }
                }
            }
        }

        Err(last_error)
    }
}
