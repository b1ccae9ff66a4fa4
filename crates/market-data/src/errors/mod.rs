//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The failure taxonomy for provider fetches
//! - [`RetryClass`]: Classification for determining retry behavior
//!
//! None of these errors escape a provider adapter. Adapters fail internally
//! with a `MarketDataError`, and the provider boundary turns it into an empty
//! [`ProviderResult`](crate::models::ProviderResult) that carries the error
//! as its reason.

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur while fetching history from a provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketDataError {
    /// Connection failure or timeout talking to the provider.
    #[error("Network failure: {provider} - {message}")]
    NetworkFailure {
        /// The provider that could not be reached
        provider: String,
        /// Transport error description
        message: String,
    },

    /// Non-success HTTP status other than a rate limit.
    #[error("Upstream rejected: {provider} - HTTP {status}")]
    UpstreamRejected {
        /// The provider that rejected the request
        provider: String,
        /// HTTP status code
        status: u16,
    },

    /// The provider signalled throttling (HTTP 429 or an in-band note).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The provider's daily or plan quota is used up. Waiting within the run
    /// will not help.
    #[error("Quota exhausted: {provider} - {message}")]
    QuotaExhausted {
        /// The provider that refused the request
        provider: String,
        /// The provider's notice
        message: String,
    },

    /// The payload had an unexpected shape or could not be decoded.
    #[error("Malformed payload: {provider} - {message}")]
    MalformedPayload {
        /// The provider that returned the payload
        provider: String,
        /// What was wrong with it
        message: String,
    },

    /// The provider answered but had no usable points for the range.
    #[error("No data for date range")]
    NoDataForRange,

    /// The adapter cannot serve this symbol (market or suffix not covered).
    #[error("Unsupported symbol for {provider}: {symbol}")]
    Unsupported {
        /// The provider that declined the symbol
        provider: String,
        /// The declined symbol
        symbol: String,
    },

    /// Every provider in the chain came back empty.
    #[error("No provider succeeded")]
    NoProviderSucceeded,
}

impl MarketDataError {
    pub(crate) fn network(provider: &str, err: impl std::fmt::Display) -> Self {
        Self::NetworkFailure {
            provider: provider.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn malformed(provider: &str, message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn rate_limited(provider: &str) -> Self {
        Self::RateLimited {
            provider: provider.to_string(),
        }
    }

    pub(crate) fn quota_exhausted(provider: &str, message: impl Into<String>) -> Self {
        Self::QuotaExhausted {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    /// Returns the retry classification for this error.
    ///
    /// - [`RetryClass::WithBackoff`]: retry the same provider after a delay
    /// - [`RetryClass::FailoverWithPenalty`]: next provider, count a breaker failure
    /// - [`RetryClass::NextProvider`]: next provider, no penalty
    ///
    /// # Examples
    ///
    /// ```
    /// use tickerbook_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::RateLimited { provider: "YAHOO".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = MarketDataError::NoDataForRange;
    /// assert_eq!(error.retry_class(), RetryClass::NextProvider);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::RateLimited { .. } => RetryClass::WithBackoff,

            Self::NetworkFailure { .. } => RetryClass::FailoverWithPenalty,

            Self::UpstreamRejected { .. }
            | Self::QuotaExhausted { .. }
            | Self::MalformedPayload { .. }
            | Self::NoDataForRange
            | Self::Unsupported { .. }
            | Self::NoProviderSucceeded => RetryClass::NextProvider,
        }
    }

    /// Short machine-friendly label used in structured log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NetworkFailure { .. } => "network_failure",
            Self::UpstreamRejected { .. } => "upstream_rejected",
            Self::RateLimited { .. } => "rate_limited",
            Self::QuotaExhausted { .. } => "quota_exhausted",
            Self::MalformedPayload { .. } => "malformed_payload",
            Self::NoDataForRange => "no_data",
            Self::Unsupported { .. } => "unsupported",
            Self::NoProviderSucceeded => "no_provider_succeeded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_retries_with_backoff() {
        let error = MarketDataError::rate_limited("YAHOO");
        assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    }

    #[test]
    fn test_network_failure_fails_over_with_penalty() {
        let error = MarketDataError::network("FINNHUB", "connection reset");
        assert_eq!(error.retry_class(), RetryClass::FailoverWithPenalty);
    }

    #[test]
    fn test_rejections_try_next_provider() {
        let error = MarketDataError::UpstreamRejected {
            provider: "STOOQ".to_string(),
            status: 500,
        };
        assert_eq!(error.retry_class(), RetryClass::NextProvider);
        assert_eq!(
            MarketDataError::malformed("ALLTICK", "no kline array").retry_class(),
            RetryClass::NextProvider
        );
        assert_eq!(
            MarketDataError::NoDataForRange.retry_class(),
            RetryClass::NextProvider
        );
    }

    #[test]
    fn test_quota_exhausted_moves_on_without_backoff() {
        let error = MarketDataError::quota_exhausted("STOOQ", "Exceeded the daily hits limit");
        assert_eq!(error.retry_class(), RetryClass::NextProvider);
        assert_eq!(error.kind(), "quota_exhausted");
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::rate_limited("YAHOO");
        assert_eq!(format!("{}", error), "Rate limited: YAHOO");

        let error = MarketDataError::UpstreamRejected {
            provider: "ALPHA_VANTAGE".to_string(),
            status: 503,
        };
        assert_eq!(
            format!("{}", error),
            "Upstream rejected: ALPHA_VANTAGE - HTTP 503"
        );
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(MarketDataError::NoProviderSucceeded.kind(), "no_provider_succeeded");
        assert_eq!(MarketDataError::rate_limited("X").kind(), "rate_limited");
    }
}
