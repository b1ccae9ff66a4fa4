//! Provider capabilities and rate limiting configuration.
//!
//! This module defines structures for describing which symbols a history
//! provider can serve and how it should be paced.

use std::time::Duration;

use crate::models::Market;

/// Describes which markets a history provider can serve.
///
/// Used by the chain builder to leave out providers that would only answer
/// `Unsupported` for a symbol.
#[derive(Clone, Debug)]
pub struct ProviderCapabilities {
    /// Markets this provider serves. Empty means any market.
    pub markets: Vec<Market>,

    /// Markets this provider declines even when `markets` is empty.
    pub excluded_markets: Vec<Market>,
}

impl ProviderCapabilities {
    /// Any market.
    pub fn open() -> Self {
        Self {
            markets: Vec::new(),
            excluded_markets: Vec::new(),
        }
    }

    /// Whether a symbol in `market` may be routed to this provider.
    pub fn serves(&self, market: &Market) -> bool {
        if self.excluded_markets.contains(market) {
            return false;
        }
        self.markets.is_empty() || self.markets.contains(market)
    }
}

/// Rate limiting configuration for a provider.
///
/// Controls how aggressively we can call a provider to avoid
/// hitting their rate limits and getting blocked.
#[derive(Clone, Debug)]
pub struct RateLimit {
    /// Maximum requests allowed per minute.
    pub requests_per_minute: u32,

    /// Requests that may go out back to back before the per-minute rate
    /// applies.
    pub burst: usize,

    /// Minimum delay between two requests to this provider.
    pub min_delay: Duration,

    /// Pause taken after a successful fetch from this provider.
    pub cool_down: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            burst: 5,
            min_delay: Duration::from_millis(100),
            cool_down: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_serves_everything() {
        let caps = ProviderCapabilities::open();
        assert!(caps.serves(&Market::Us));
        assert!(caps.serves(&Market::Cn));
        assert!(caps.serves(&Market::Fx));
    }

    #[test]
    fn test_restricted_markets() {
        let caps = ProviderCapabilities {
            markets: vec![Market::Cn],
            excluded_markets: Vec::new(),
        };
        assert!(caps.serves(&Market::Cn));
        assert!(!caps.serves(&Market::Us));
    }

    #[test]
    fn test_excluded_markets() {
        let caps = ProviderCapabilities {
            markets: Vec::new(),
            excluded_markets: vec![Market::Crypto, Market::Fx],
        };
        assert!(caps.serves(&Market::Us));
        assert!(!caps.serves(&Market::Fx));
    }
}
