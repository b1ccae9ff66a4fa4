//! History provider trait definitions.
//!
//! This module defines the core `HistoryProvider` trait that all
//! daily history sources must implement.

use std::borrow::Cow;

use async_trait::async_trait;
use log::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::{HistoryWindow, ProviderResult, Ticker, TimeSeries};

use super::capabilities::{ProviderCapabilities, RateLimit};

/// Trait for daily history providers.
///
/// Implementors only write [`fetch_history`](HistoryProvider::fetch_history),
/// which may fail with any [`MarketDataError`]. Callers use the provided
/// [`fetch`](HistoryProvider::fetch), which never fails: errors come back as
/// [`ProviderResult::Empty`] and are logged here, once, for every adapter.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use tickerbook_market_data::provider::{HistoryProvider, ProviderCapabilities, RateLimit};
///
/// struct MyProvider;
///
/// #[async_trait]
/// impl HistoryProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     fn capabilities(&self) -> ProviderCapabilities {
///         ProviderCapabilities::open()
///     }
///
///     fn rate_limit(&self) -> RateLimit {
///         RateLimit::default()
///     }
///
///     async fn fetch_history(
///         &self,
///         ticker: &Ticker,
///         window: &HistoryWindow,
///     ) -> Result<TimeSeries, MarketDataError> {
///         // ... call the upstream and normalize
///     }
/// }
/// ```
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "YAHOO", "STOOQ", etc.
    /// Used for logging, chain policy, circuit breaker and rate limiter keys.
    fn id(&self) -> &'static str;

    /// Provider priority for ordering.
    ///
    /// Lower values = higher priority. Default is 10. Only consulted for
    /// registered providers the chain policy does not name.
    fn priority(&self) -> u8 {
        10
    }

    /// Describes which markets this provider can serve.
    fn capabilities(&self) -> ProviderCapabilities;

    /// Rate limiting configuration, including the post-success cool-down.
    fn rate_limit(&self) -> RateLimit;

    /// Whether this provider can serve `ticker`.
    ///
    /// Defaults to a market check against [`capabilities`](Self::capabilities).
    /// Adapters with symbol-shape restrictions override this.
    fn supports(&self, ticker: &Ticker) -> bool {
        self.capabilities().serves(&ticker.market())
    }

    /// Fetch and normalize daily closes for `ticker` within `window`.
    ///
    /// The returned series must already be ascending and trimmed to the
    /// window; building it through [`TimeSeries::from_points`] takes care of
    /// ordering and duplicates.
    async fn fetch_history(
        &self,
        ticker: &Ticker,
        window: &HistoryWindow,
    ) -> Result<TimeSeries, MarketDataError>;

    /// Infallible fetch used by the orchestrator.
    async fn fetch(&self, ticker: &Ticker, window: &HistoryWindow) -> ProviderResult {
        if !self.supports(ticker) {
            debug!("{} does not serve {}", self.id(), ticker);
            return ProviderResult::Empty(MarketDataError::Unsupported {
                provider: self.id().to_string(),
                symbol: ticker.symbol.clone(),
            });
        }

        match self.fetch_history(ticker, window).await {
            Ok(points) => {
                debug!("{} returned {} points for {}", self.id(), points.len(), ticker);
                ProviderResult::from_points(Cow::Borrowed(self.id()), points)
            }
            Err(err) => {
                warn!(
                    "{} fetch failed for {} [{}]: {}",
                    self.id(),
                    ticker,
                    err.kind(),
                    err
                );
                ProviderResult::Empty(err)
            }
        }
    }
}
