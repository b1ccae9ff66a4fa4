//! History client facade.
//!
//! Builds the provider set from [`ProviderSettings`] and hands symbols to the
//! fallback orchestrator. Providers whose credential is missing are left out,
//! so the chain only ever contains providers that can actually be called.

use std::sync::Arc;

use log::{debug, info, warn};
use tickerbook_market_data::{
    AlltickConfig, AlltickProvider, AlphaVantageProvider, BackoffPolicy, ChainPolicy,
    EastmoneyProvider, FallbackOrchestrator, FetchDiagnostics, FinnhubProvider, HistoryProvider,
    HistoryWindow, ProviderResult, StooqProvider, Ticker, TimeSeries, YahooProvider,
    YahooWorkerConfig, YahooWorkerProvider,
};

use super::provider_settings::ProviderSettings;
use crate::constants::{
    DATA_SOURCE_ALLTICK, DATA_SOURCE_ALPHA_VANTAGE, DATA_SOURCE_EASTMONEY, DATA_SOURCE_FINNHUB,
    DATA_SOURCE_STOOQ, DATA_SOURCE_YAHOO, DATA_SOURCE_YAHOO_WORKER,
};
use crate::errors::{Error, Result};

/// Every provider this client knows how to build.
const KNOWN_PROVIDERS: [&str; 7] = [
    DATA_SOURCE_YAHOO_WORKER,
    DATA_SOURCE_YAHOO,
    DATA_SOURCE_FINNHUB,
    DATA_SOURCE_ALPHA_VANTAGE,
    DATA_SOURCE_STOOQ,
    DATA_SOURCE_EASTMONEY,
    DATA_SOURCE_ALLTICK,
];

const WORKER_RANGES: [&str; 5] = ["1y", "2y", "5y", "10y", "max"];

pub struct HistoryClient {
    orchestrator: FallbackOrchestrator,
}

impl HistoryClient {
    /// Create a client with every provider `settings` allows.
    ///
    /// Returns an error only for settings that are present but invalid; a
    /// missing credential just skips the provider.
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        let mut providers: Vec<Arc<dyn HistoryProvider>> = Vec::new();

        for provider_id in KNOWN_PROVIDERS {
            match Self::create_provider(provider_id, settings)? {
                Some(provider) => {
                    info!("Initialized history provider: {}", provider_id);
                    providers.push(provider);
                }
                None => {
                    debug!(
                        "Provider {} requires a credential but none found, skipping",
                        provider_id
                    );
                }
            }
        }

        let policy = Self::chain_policy(settings);
        info!(
            "History client initialized with {} providers: {:?}",
            providers.len(),
            providers.iter().map(|p| p.id()).collect::<Vec<_>>()
        );

        Ok(Self::from_providers(providers).with_policy(policy))
    }

    /// Client over an explicit provider set with the default chain policy.
    pub fn from_providers(providers: Vec<Arc<dyn HistoryProvider>>) -> Self {
        Self {
            orchestrator: FallbackOrchestrator::new(providers),
        }
    }

    pub fn with_policy(self, policy: ChainPolicy) -> Self {
        Self {
            orchestrator: self.orchestrator.with_policy(policy),
        }
    }

    pub fn with_backoff(self, backoff: BackoffPolicy) -> Self {
        Self {
            orchestrator: self.orchestrator.with_backoff(backoff),
        }
    }

    /// Create a provider by ID from its settings.
    fn create_provider(
        provider_id: &str,
        settings: &ProviderSettings,
    ) -> Result<Option<Arc<dyn HistoryProvider>>> {
        match provider_id {
            DATA_SOURCE_YAHOO => Ok(Some(Arc::new(YahooProvider::new()))),
            DATA_SOURCE_STOOQ => Ok(Some(Arc::new(StooqProvider::new()))),
            DATA_SOURCE_EASTMONEY => Ok(Some(Arc::new(EastmoneyProvider::new()))),
            DATA_SOURCE_FINNHUB => Ok(ProviderSettings::non_blank(&settings.finnhub_api_key)
                .map(|key| Arc::new(FinnhubProvider::new(key)) as Arc<dyn HistoryProvider>)),
            DATA_SOURCE_ALPHA_VANTAGE => {
                Ok(ProviderSettings::non_blank(&settings.alpha_vantage_api_key).map(|key| {
                    Arc::new(AlphaVantageProvider::new(key)) as Arc<dyn HistoryProvider>
                }))
            }
            DATA_SOURCE_ALLTICK => {
                let Some(api_key) = ProviderSettings::non_blank(&settings.alltick_api_key) else {
                    return Ok(None);
                };
                let provider = AlltickProvider::new(AlltickConfig {
                    api_key,
                    history_url: ProviderSettings::non_blank(&settings.alltick_history_url),
                });
                Ok(Some(Arc::new(provider)))
            }
            DATA_SOURCE_YAHOO_WORKER => {
                let Some(base_url) = ProviderSettings::non_blank(&settings.yahoo_worker_url) else {
                    return Ok(None);
                };
                if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                    return Err(Error::InvalidConfigValue(format!(
                        "yahoo worker url must be http(s): {}",
                        base_url
                    )));
                }
                let range = ProviderSettings::non_blank(&settings.yahoo_worker_range);
                if let Some(range) = &range {
                    if !WORKER_RANGES.contains(&range.as_str()) {
                        return Err(Error::InvalidConfigValue(format!(
                            "yahoo worker range '{}' is not one of {:?}",
                            range, WORKER_RANGES
                        )));
                    }
                }
                let provider = YahooWorkerProvider::new(YahooWorkerConfig {
                    base_url: base_url.trim_end_matches('/').to_string(),
                    token: ProviderSettings::non_blank(&settings.yahoo_worker_token),
                    range,
                });
                Ok(Some(Arc::new(provider)))
            }
            _ => {
                warn!("Unknown provider ID: {}", provider_id);
                Ok(None)
            }
        }
    }

    /// Default chain policy, with the default order replaced when the
    /// settings carry an override.
    fn chain_policy(settings: &ProviderSettings) -> ChainPolicy {
        let policy = ChainPolicy::default();
        let Some(order) = &settings.chain_override else {
            return policy;
        };

        let order: Vec<String> = order
            .iter()
            .map(|id| id.trim().to_uppercase())
            .filter(|id| !id.is_empty())
            .collect();
        if order.is_empty() {
            return policy;
        }

        for id in &order {
            if !KNOWN_PROVIDERS.contains(&id.as_str()) {
                warn!("Chain override names unknown provider '{}'", id);
            }
        }
        info!("Provider chain override: {:?}", order);
        policy.with_default_order(order)
    }

    /// Fetch fresh history for `ticker` through the provider chain.
    pub async fn acquire(
        &self,
        ticker: &Ticker,
        existing: &TimeSeries,
        retention_years: u32,
    ) -> ProviderResult {
        self.orchestrator
            .acquire(ticker, existing, retention_years)
            .await
    }

    /// [`acquire`](Self::acquire) for an explicit window, with diagnostics.
    pub async fn acquire_with_diagnostics(
        &self,
        ticker: &Ticker,
        existing: &TimeSeries,
        window: &HistoryWindow,
    ) -> (ProviderResult, FetchDiagnostics) {
        self.orchestrator
            .acquire_with_diagnostics(ticker, existing, window)
            .await
    }

    /// Provider IDs in the order they were registered.
    pub fn providers(&self) -> Vec<&'static str> {
        self.orchestrator.providers().iter().map(|p| p.id()).collect()
    }

    pub fn has_providers(&self) -> bool {
        !self.orchestrator.providers().is_empty()
    }

    /// Provider IDs that would be tried for `ticker`, in order.
    pub fn chain_for(&self, ticker: &Ticker) -> Vec<&'static str> {
        self.orchestrator
            .chain_for(ticker)
            .iter()
            .map(|p| p.id())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyless_providers_only() {
        let client = HistoryClient::new(&ProviderSettings::default()).unwrap();
        assert_eq!(
            client.providers(),
            vec![DATA_SOURCE_YAHOO, DATA_SOURCE_STOOQ, DATA_SOURCE_EASTMONEY]
        );
    }

    #[test]
    fn test_blank_key_is_missing() {
        let settings = ProviderSettings {
            finnhub_api_key: Some("   ".into()),
            ..Default::default()
        };
        let client = HistoryClient::new(&settings).unwrap();
        assert!(!client.providers().contains(&DATA_SOURCE_FINNHUB));
    }

    #[test]
    fn test_all_providers_with_credentials() {
        let settings = ProviderSettings {
            finnhub_api_key: Some("f".into()),
            alpha_vantage_api_key: Some("a".into()),
            alltick_api_key: Some("t".into()),
            yahoo_worker_url: Some("https://worker.example.com/".into()),
            ..Default::default()
        };
        let client = HistoryClient::new(&settings).unwrap();
        assert_eq!(client.providers().len(), 7);

        assert_eq!(
            client.chain_for(&Ticker::new("AAPL")),
            vec![
                DATA_SOURCE_YAHOO_WORKER,
                DATA_SOURCE_YAHOO,
                DATA_SOURCE_FINNHUB,
                DATA_SOURCE_ALPHA_VANTAGE,
                DATA_SOURCE_STOOQ,
            ]
        );
        assert_eq!(
            client.chain_for(&Ticker::new("600519.SS")),
            vec![
                DATA_SOURCE_EASTMONEY,
                DATA_SOURCE_ALLTICK,
                DATA_SOURCE_YAHOO_WORKER,
                DATA_SOURCE_YAHOO,
                DATA_SOURCE_ALPHA_VANTAGE,
            ]
        );
    }

    #[test]
    fn test_invalid_worker_url() {
        let settings = ProviderSettings {
            yahoo_worker_url: Some("worker.example.com".into()),
            ..Default::default()
        };
        assert!(matches!(
            HistoryClient::new(&settings),
            Err(Error::InvalidConfigValue(_))
        ));
    }

    #[test]
    fn test_invalid_worker_range() {
        let settings = ProviderSettings {
            yahoo_worker_url: Some("https://worker.example.com".into()),
            yahoo_worker_range: Some("3y".into()),
            ..Default::default()
        };
        assert!(HistoryClient::new(&settings).is_err());
    }

    #[test]
    fn test_chain_override() {
        let settings = ProviderSettings {
            chain_override: Some(vec!["stooq".into(), " yahoo ".into()]),
            ..Default::default()
        };
        let client = HistoryClient::new(&settings).unwrap();
        assert_eq!(
            client.chain_for(&Ticker::new("MSFT")),
            vec![DATA_SOURCE_STOOQ, DATA_SOURCE_YAHOO]
        );
    }
}
