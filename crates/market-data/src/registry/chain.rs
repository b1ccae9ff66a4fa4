//! Provider chain ordering.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{Market, ProviderId, Ticker};
use crate::provider::HistoryProvider;

/// Order used for every market without a regional list.
pub const DEFAULT_ORDER: [&str; 5] = ["YAHOO_WORKER", "YAHOO", "FINNHUB", "ALPHA_VANTAGE", "STOOQ"];

/// Providers tried ahead of the default order for China A-shares.
pub const CN_ORDER: [&str; 2] = ["EASTMONEY", "ALLTICK"];

/// Which providers are tried for a symbol, and in what order.
///
/// The chain for a ticker is its market's regional list, then the default
/// order, then any other registered provider by ascending priority. Each
/// provider appears once; providers that are not registered or do not
/// support the ticker are dropped.
#[derive(Clone, Debug)]
pub struct ChainPolicy {
    regional: HashMap<Market, Vec<ProviderId>>,
    default_order: Vec<ProviderId>,
}

impl ChainPolicy {
    /// Policy with no regional lists and the given default order.
    pub fn new<I, S>(default_order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ProviderId>,
    {
        Self {
            regional: HashMap::new(),
            default_order: default_order.into_iter().map(Into::into).collect(),
        }
    }

    /// Put `providers` ahead of the default order for `market`.
    pub fn with_regional<I, S>(mut self, market: Market, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ProviderId>,
    {
        self.regional
            .insert(market, providers.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the default order, keeping regional lists.
    pub fn with_default_order<I, S>(mut self, default_order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ProviderId>,
    {
        self.default_order = default_order.into_iter().map(Into::into).collect();
        self
    }

    /// Named provider order for a market, duplicates removed.
    pub fn order_for(&self, market: &Market) -> Vec<ProviderId> {
        let mut order: Vec<ProviderId> = Vec::new();
        let regional = self.regional.get(market).into_iter().flatten();
        for id in regional.chain(self.default_order.iter()) {
            if !order.contains(id) {
                order.push(id.clone());
            }
        }
        order
    }

    /// Resolve the concrete chain for `ticker` from the registered providers.
    pub fn build_chain(
        &self,
        ticker: &Ticker,
        providers: &[Arc<dyn HistoryProvider>],
    ) -> Vec<Arc<dyn HistoryProvider>> {
        let named = self.order_for(&ticker.market());

        let mut chain: Vec<Arc<dyn HistoryProvider>> = named
            .iter()
            .filter_map(|id| providers.iter().find(|p| p.id() == id.as_ref()))
            .cloned()
            .collect();

        let mut unlisted: Vec<Arc<dyn HistoryProvider>> = providers
            .iter()
            .filter(|p| !named.iter().any(|id| id.as_ref() == p.id()))
            .cloned()
            .collect();
        unlisted.sort_by_key(|p| p.priority());
        chain.extend(unlisted);

        chain.retain(|p| p.supports(ticker));
        chain
    }
}

impl Default for ChainPolicy {
    fn default() -> Self {
        ChainPolicy::new(DEFAULT_ORDER.map(Cow::Borrowed))
            .with_regional(Market::Cn, CN_ORDER.map(Cow::Borrowed))
    }
}
