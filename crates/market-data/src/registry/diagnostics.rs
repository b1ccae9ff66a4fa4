//! Per-symbol record of what the fallback chain did.

use std::time::Duration;

use crate::errors::MarketDataError;
use crate::models::ProviderId;

/// Why a provider was passed over without being called.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Circuit breaker is open for this provider.
    CircuitOpen,
}

/// What a single provider call produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success { points: usize },
    Empty(MarketDataError),
    Skipped(SkipReason),
}

/// Record of a single provider attempt.
#[derive(Clone, Debug)]
pub struct ProviderAttempt {
    pub provider_id: ProviderId,
    /// 1-based call number for this provider; 0 for skips.
    pub attempt: u32,
    pub outcome: AttemptOutcome,
    pub elapsed: Duration,
}

/// All attempts made while acquiring one symbol, in order.
#[derive(Clone, Debug, Default)]
pub struct FetchDiagnostics {
    pub attempts: Vec<ProviderAttempt>,
}

impl FetchDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_skip(&mut self, provider_id: ProviderId, reason: SkipReason) {
        self.attempts.push(ProviderAttempt {
            provider_id,
            attempt: 0,
            outcome: AttemptOutcome::Skipped(reason),
            elapsed: Duration::ZERO,
        });
    }

    pub fn record_empty(
        &mut self,
        provider_id: ProviderId,
        attempt: u32,
        reason: MarketDataError,
        elapsed: Duration,
    ) {
        self.attempts.push(ProviderAttempt {
            provider_id,
            attempt,
            outcome: AttemptOutcome::Empty(reason),
            elapsed,
        });
    }

    pub fn record_success(
        &mut self,
        provider_id: ProviderId,
        attempt: u32,
        points: usize,
        elapsed: Duration,
    ) {
        self.attempts.push(ProviderAttempt {
            provider_id,
            attempt,
            outcome: AttemptOutcome::Success { points },
            elapsed,
        });
    }

    /// One-line summary for logs, e.g. `YAHOO#1: rate_limited -> YAHOO#2: ok(250)`.
    pub fn summary(&self) -> String {
        if self.attempts.is_empty() {
            return "no providers".to_string();
        }
        self.attempts
            .iter()
            .map(|a| match &a.outcome {
                AttemptOutcome::Success { points } => {
                    format!("{}#{}: ok({})", a.provider_id, a.attempt, points)
                }
                AttemptOutcome::Empty(reason) => {
                    format!("{}#{}: {}", a.provider_id, a.attempt, reason.kind())
                }
                AttemptOutcome::Skipped(reason) => {
                    format!("{}: skipped ({:?})", a.provider_id, reason)
                }
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    pub fn has_success(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| matches!(a.outcome, AttemptOutcome::Success { .. }))
    }

    /// Number of real calls made to `provider`.
    pub fn calls_to(&self, provider: &str) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.provider_id == provider && a.attempt > 0)
            .count()
    }

    /// Providers that came back empty, with their reasons.
    pub fn errors(&self) -> Vec<(&ProviderId, &MarketDataError)> {
        self.attempts
            .iter()
            .filter_map(|a| match &a.outcome {
                AttemptOutcome::Empty(reason) => Some((&a.provider_id, reason)),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;

    #[test]
    fn test_summary() {
        let mut diag = FetchDiagnostics::new();
        diag.record_skip(Cow::Borrowed("FINNHUB"), SkipReason::CircuitOpen);
        diag.record_empty(
            Cow::Borrowed("YAHOO"),
            1,
            MarketDataError::rate_limited("YAHOO"),
            Duration::from_millis(5),
        );
        diag.record_success(Cow::Borrowed("YAHOO"), 2, 250, Duration::from_millis(5));

        assert_eq!(
            diag.summary(),
            "FINNHUB: skipped (CircuitOpen) -> YAHOO#1: rate_limited -> YAHOO#2: ok(250)"
        );
        assert!(diag.has_success());
        assert_eq!(diag.calls_to("YAHOO"), 2);
        assert_eq!(diag.calls_to("FINNHUB"), 0);
        assert_eq!(diag.errors().len(), 1);
    }

    #[test]
    fn test_empty_diagnostics() {
        let diag = FetchDiagnostics::new();
        assert!(!diag.has_success());
        assert_eq!(diag.summary(), "no providers");
    }
}
