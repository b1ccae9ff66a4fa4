//! Yahoo chart v8 response structures.
//!
//! Only the fields the daily close series needs are mapped; everything
//! else in the payload is ignored.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct YahooChartResponse {
    pub chart: YahooChart,
}

#[derive(Debug, Deserialize)]
pub struct YahooChart {
    #[serde(default)]
    pub result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    pub error: Option<YahooChartError>,
}

#[derive(Debug, Deserialize)]
pub struct YahooChartError {
    pub code: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct YahooChartResult {
    /// Bar open times, Unix seconds.
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
pub struct YahooIndicators {
    #[serde(default)]
    pub quote: Vec<YahooQuoteColumns>,
}

/// Columnar OHLC; entries are null on halted days.
#[derive(Debug, Deserialize)]
pub struct YahooQuoteColumns {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}
