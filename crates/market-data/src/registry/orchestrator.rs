//! Fallback orchestrator: drives the provider chain for one symbol.
//!
//! For each provider in chain order:
//! 1. Skip it if an attached circuit breaker has opened its circuit
//! 2. Wait for its rate limiter (cool-down first, then a token)
//! 3. Fetch; stop at the first non-empty series
//! 4. On a throttle signal, back off and call the same provider again, up to
//!    the attempt budget
//! 5. After a success, start and wait out the provider's cool-down
//!
//! The breaker is opt-in and only counts transport failures, so a provider
//! that was merely throttled for one symbol is still tried first for the
//! next one.
//!
//! Only the first successful provider is used. When every provider comes
//! back empty the result is `Empty(NoProviderSucceeded)`, which is a normal
//! outcome rather than an error.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};

use super::backoff::BackoffPolicy;
use super::chain::ChainPolicy;
use super::circuit_breaker::CircuitBreaker;
use super::diagnostics::{FetchDiagnostics, SkipReason};
use super::rate_limiter::{RateLimitConfig, RateLimiter};
use crate::errors::{MarketDataError, RetryClass};
use crate::models::{HistoryWindow, ProviderId, ProviderResult, Ticker, TimeSeries};
use crate::provider::HistoryProvider;

pub struct FallbackOrchestrator {
    providers: Vec<Arc<dyn HistoryProvider>>,
    policy: ChainPolicy,
    rate_limiter: Arc<RateLimiter>,
    circuit_breaker: Option<Arc<CircuitBreaker>>,
    backoff: BackoffPolicy,
}

impl FallbackOrchestrator {
    /// Orchestrator over `providers` with the default chain policy, backoff,
    /// a fresh limiter and no circuit breaker.
    pub fn new(providers: Vec<Arc<dyn HistoryProvider>>) -> Self {
        Self::with_shared_state(providers, Arc::new(RateLimiter::new()))
    }

    /// Orchestrator that shares pacing state with other users of the same
    /// limiter.
    pub fn with_shared_state(
        providers: Vec<Arc<dyn HistoryProvider>>,
        rate_limiter: Arc<RateLimiter>,
    ) -> Self {
        for provider in &providers {
            let id: ProviderId = Cow::Borrowed(provider.id());
            rate_limiter.configure(&id, RateLimitConfig::from(&provider.rate_limit()));
        }

        Self {
            providers,
            policy: ChainPolicy::default(),
            rate_limiter,
            circuit_breaker: None,
            backoff: BackoffPolicy::default(),
        }
    }

    /// Skip providers whose circuit `breaker` has opened after repeated
    /// transport failures.
    pub fn with_circuit_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.circuit_breaker = Some(breaker);
        self
    }

    pub fn with_policy(mut self, policy: ChainPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn providers(&self) -> &[Arc<dyn HistoryProvider>] {
        &self.providers
    }

    /// The ordered providers that would be tried for `ticker`.
    pub fn chain_for(&self, ticker: &Ticker) -> Vec<Arc<dyn HistoryProvider>> {
        self.policy.build_chain(ticker, &self.providers)
    }

    /// Fetch fresh history for `ticker` covering `retention_years`.
    ///
    /// `existing` is only used for diagnostics; the caller merges.
    pub async fn acquire(
        &self,
        ticker: &Ticker,
        existing: &TimeSeries,
        retention_years: u32,
    ) -> ProviderResult {
        let window = HistoryWindow::trailing_from_now(retention_years);
        let (result, diagnostics) = self
            .acquire_with_diagnostics(ticker, existing, &window)
            .await;
        debug!("{} chain: {}", ticker, diagnostics.summary());
        result
    }

    /// Same as [`acquire`](Self::acquire) for an explicit window, also
    /// returning every attempt made.
    pub async fn acquire_with_diagnostics(
        &self,
        ticker: &Ticker,
        existing: &TimeSeries,
        window: &HistoryWindow,
    ) -> (ProviderResult, FetchDiagnostics) {
        let mut diagnostics = FetchDiagnostics::new();
        let chain = self.chain_for(ticker);

        info!(
            "Acquiring {} ({} existing points, last {:?}) via [{}]",
            ticker,
            existing.len(),
            existing.last_date(),
            chain.iter().map(|p| p.id()).collect::<Vec<_>>().join(", ")
        );

        for provider in chain {
            let provider_id: ProviderId = Cow::Borrowed(provider.id());

            let circuit_open = self
                .circuit_breaker
                .as_ref()
                .is_some_and(|breaker| !breaker.is_allowed(&provider_id));
            if circuit_open {
                debug!("Circuit open for '{}', skipping", provider_id);
                diagnostics.record_skip(provider_id, SkipReason::CircuitOpen);
                continue;
            }

            let max_attempts = self.backoff.max_attempts.max(1);
            for attempt in 1..=max_attempts {
                self.rate_limiter.acquire(&provider_id).await;

                let started = Instant::now();
                let result = provider.fetch(ticker, window).await;
                let elapsed = started.elapsed();

                let reason = match result {
                    ProviderResult::Series { source, points } => {
                        if let Some(breaker) = &self.circuit_breaker {
                            breaker.record_success(&provider_id);
                        }
                        diagnostics.record_success(
                            provider_id.clone(),
                            attempt,
                            points.len(),
                            elapsed,
                        );
                        info!(
                            "{}: {} points from '{}' (attempt {})",
                            ticker,
                            points.len(),
                            source,
                            attempt
                        );
                        self.cool_down(provider.as_ref(), &provider_id).await;
                        return (ProviderResult::Series { source, points }, diagnostics);
                    }
                    ProviderResult::Empty(reason) => reason,
                };

                diagnostics.record_empty(provider_id.clone(), attempt, reason.clone(), elapsed);

                match reason.retry_class() {
                    RetryClass::WithBackoff => {
                        if attempt < max_attempts {
                            let delay = self.backoff.delay(attempt);
                            warn!(
                                "'{}' throttled {} (attempt {}/{}), retrying in {:?}",
                                provider_id, ticker, attempt, max_attempts, delay
                            );
                            tokio::time::sleep(delay).await;
                        } else {
                            warn!(
                                "'{}' still throttled after {} attempts, moving on",
                                provider_id, max_attempts
                            );
                        }
                    }
                    RetryClass::FailoverWithPenalty => {
                        if let Some(breaker) = &self.circuit_breaker {
                            breaker.record_failure(&provider_id);
                        }
                        break;
                    }
                    RetryClass::NextProvider => break,
                }
            }
        }

        warn!("{}: no provider returned data ({})", ticker, diagnostics.summary());
        (
            ProviderResult::Empty(MarketDataError::NoProviderSucceeded),
            diagnostics,
        )
    }

    async fn cool_down(&self, provider: &dyn HistoryProvider, provider_id: &ProviderId) {
        let cool_down = provider.rate_limit().cool_down;
        if cool_down.is_zero() {
            return;
        }
        self.rate_limiter.start_cool_down(provider_id, cool_down);
        debug!("Cooling down '{}' for {:?}", provider_id, cool_down);
        tokio::time::sleep(cool_down).await;
    }
}
