//! Shared HTTP plumbing for history adapters.
//!
//! Status mapping, client construction and the small parsing helpers every
//! upstream shape needs (epoch seconds, date strings, closes that arrive as
//! numbers or strings).

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveDate};
use num_traits::FromPrimitive;
use reqwest::{Client, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::errors::MarketDataError;

/// Default per-request timeout for history endpoints.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

const USER_AGENT: &str = concat!("tickerbook/", env!("CARGO_PKG_VERSION"));

/// Build a client with the given request timeout.
pub fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Send a GET request and return the body on success.
///
/// - transport errors and timeouts become `NetworkFailure`
/// - HTTP 429 becomes `RateLimited`
/// - any other non-success status becomes `UpstreamRejected`
pub async fn get_text(provider: &str, request: RequestBuilder) -> Result<String, MarketDataError> {
    let response = request
        .send()
        .await
        .map_err(|e| MarketDataError::network(provider, e))?;

    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(MarketDataError::rate_limited(provider));
    }

    if !status.is_success() {
        return Err(MarketDataError::UpstreamRejected {
            provider: provider.to_string(),
            status: status.as_u16(),
        });
    }

    response
        .text()
        .await
        .map_err(|e| MarketDataError::network(provider, e))
}

/// Decode a JSON body, mapping failures to `MalformedPayload`.
pub fn parse_json<T: serde::de::DeserializeOwned>(
    provider: &str,
    body: &str,
) -> Result<T, MarketDataError> {
    serde_json::from_str(body)
        .map_err(|e| MarketDataError::malformed(provider, format!("invalid JSON: {}", e)))
}

/// UTC calendar date of a Unix timestamp in seconds.
pub fn date_from_epoch(secs: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive())
}

/// Parse the leading `YYYY-MM-DD` of a date or datetime string.
pub fn date_from_str(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let head = raw.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Date from a JSON value holding either a date string or epoch seconds.
///
/// Epoch values above 10^11 are taken as milliseconds.
pub fn date_from_value(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => date_from_str(s).or_else(|| {
            s.trim()
                .parse::<i64>()
                .ok()
                .and_then(date_from_epoch_any)
        }),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(date_from_epoch_any),
        _ => None,
    }
}

fn date_from_epoch_any(ts: i64) -> Option<NaiveDate> {
    if ts > 100_000_000_000 {
        date_from_epoch(ts / 1000)
    } else {
        date_from_epoch(ts)
    }
}

/// Parse a decimal close from text, rejecting zero and negatives.
pub fn close_from_str(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim())
        .ok()
        .filter(|d| *d > Decimal::ZERO)
}

/// Parse a close from a JSON number or numeric string.
pub fn close_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .filter(|f| f.is_finite() && *f > 0.0)
            .and_then(Decimal::from_f64),
        Value::String(s) => close_from_str(s),
        _ => None,
    }
}
