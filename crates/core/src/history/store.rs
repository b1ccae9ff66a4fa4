use async_trait::async_trait;
use tickerbook_market_data::TimeSeries;

use crate::errors::Result;

/// Persistence for per-symbol series.
///
/// A record is always read and written whole. Implementations must make
/// each `save` atomic per symbol; concurrent saves of different symbols
/// must not interfere.
#[async_trait]
pub trait SeriesStore: Send + Sync {
    /// Stored series for `symbol`. Missing or unreadable records load as an
    /// empty series and are logged, never returned as errors.
    async fn load(&self, symbol: &str) -> TimeSeries;

    /// Replace the stored record for `symbol`.
    async fn save(&self, symbol: &str, series: &TimeSeries) -> Result<()>;
}
