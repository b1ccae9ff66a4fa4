//! Eastmoney history provider for mainland China A-shares.
//!
//! Daily klines from the `push2his` endpoint. Each row is a comma-joined
//! string `date,open,close,high,low,volume,...`; the close is the third field.
//! Securities are addressed by `secid`: `1.{code}` for Shanghai, `0.{code}`
//! for Shenzhen.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::{HistoryWindow, Market, PricePoint, Ticker, TimeSeries};
use crate::provider::http::{self, DEFAULT_TIMEOUT};
use crate::provider::{HistoryProvider, ProviderCapabilities, RateLimit};

const BASE_URL: &str = "https://push2his.eastmoney.com/api/qt/stock/kline/get";
const PROVIDER_ID: &str = "EASTMONEY";

/// Field position of the close inside a kline row.
const CLOSE_FIELD: usize = 2;

#[derive(Debug, Deserialize)]
struct KlineResponse {
    data: Option<KlineData>,
}

#[derive(Debug, Deserialize)]
struct KlineData {
    #[serde(default)]
    klines: Vec<String>,
}

/// Eastmoney kline provider.
pub struct EastmoneyProvider {
    client: Client,
}

impl EastmoneyProvider {
    pub fn new() -> Self {
        Self {
            client: http::build_client(DEFAULT_TIMEOUT),
        }
    }

    /// Eastmoney security id for a ticker (`600519.SS` -> `1.600519`).
    fn secid(ticker: &Ticker) -> String {
        let code = ticker.base_symbol();
        let shanghai = match ticker.suffix() {
            Some(suffix) => suffix.eq_ignore_ascii_case("SS"),
            None => code.starts_with('6'),
        };
        format!("{}.{}", if shanghai { 1 } else { 0 }, code)
    }

    fn parse_klines(body: &str) -> Result<TimeSeries, MarketDataError> {
        let response: KlineResponse = http::parse_json(PROVIDER_ID, body)?;

        let Some(data) = response.data else {
            return Err(MarketDataError::NoDataForRange);
        };

        let points = data.klines.iter().filter_map(|row| {
            let mut fields = row.split(',');
            let date = fields.next().and_then(http::date_from_str)?;
            let close = fields.nth(CLOSE_FIELD - 1).and_then(http::close_from_str)?;
            Some(PricePoint::new(date, close))
        });

        Ok(TimeSeries::from_points(points))
    }
}

impl Default for EastmoneyProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryProvider for EastmoneyProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        6
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            markets: vec![Market::Cn],
            excluded_markets: Vec::new(),
        }
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 60,
            burst: 2,
            min_delay: Duration::from_millis(200),
            cool_down: Duration::ZERO,
        }
    }

    async fn fetch_history(
        &self,
        ticker: &Ticker,
        window: &HistoryWindow,
    ) -> Result<TimeSeries, MarketDataError> {
        let secid = Self::secid(ticker);
        let beg = window.start.format("%Y%m%d").to_string();
        let end = window.end.format("%Y%m%d").to_string();

        debug!("Eastmoney klines for {} secid={} {}..{}", ticker, secid, beg, end);

        let request = self.client.get(BASE_URL).query(&[
            ("secid", secid.as_str()),
            ("fields1", "f1,f2,f3,f4,f5,f6"),
            ("fields2", "f51,f52,f53,f54,f55,f56"),
            ("klt", "101"),
            ("fqt", "0"),
            ("beg", beg.as_str()),
            ("end", end.as_str()),
        ]);

        let body = http::get_text(PROVIDER_ID, request).await?;
        Ok(Self::parse_klines(&body)?.trim_before(window.cutoff()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_klines() {
        let body = r#"{"rc":0,"data":{"code":"600519","klines":[
            "2024-01-03,1700.00,1685.01,1710.00,1680.00,12345",
            "2024-01-02,1720.00,1700.50,1725.00,1695.00,23456",
            "bad row"
        ]}}"#;
        let series = EastmoneyProvider::parse_klines(body).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(
            series.first_date(),
            NaiveDate::from_ymd_opt(2024, 1, 2)
        );
        assert_eq!(
            series.close_on(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()),
            Some(dec!(1685.01))
        );
    }

    #[test]
    fn test_parse_klines_null_data() {
        assert_eq!(
            EastmoneyProvider::parse_klines(r#"{"rc":0,"data":null}"#).unwrap_err(),
            MarketDataError::NoDataForRange
        );
    }

    #[test]
    fn test_secid() {
        assert_eq!(EastmoneyProvider::secid(&Ticker::new("600519.SS")), "1.600519");
        assert_eq!(EastmoneyProvider::secid(&Ticker::new("000001.SZ")), "0.000001");
        assert_eq!(
            EastmoneyProvider::secid(&Ticker::with_market("601318", "CN")),
            "1.601318"
        );
        assert_eq!(
            EastmoneyProvider::secid(&Ticker::with_market("300750", "CN")),
            "0.300750"
        );
    }

    #[test]
    fn test_supports_cn_only() {
        let provider = EastmoneyProvider::new();
        assert!(provider.supports(&Ticker::new("600519.SS")));
        assert!(!provider.supports(&Ticker::new("AAPL")));
    }
}
