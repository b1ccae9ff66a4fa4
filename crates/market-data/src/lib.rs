//! Tickerbook Market Data Crate
//!
//! Daily close history from free and rate-limited upstream sources.
//!
//! # Overview
//!
//! The crate supports:
//! - A canonical, always-ascending daily close series
//! - Multiple providers: Yahoo (direct and via a proxy worker), Finnhub,
//!   Alpha Vantage, Stooq, Eastmoney, Alltick
//! - Per-market chain ordering with first-success short-circuit
//! - Rate limiting, cool-downs, backoff and circuit breaking
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |      Ticker      |  (symbol + market)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |   ChainPolicy    |  (market -> ordered providers)
//! +------------------+
//!          |
//!          v
//! +----------------------+
//! | FallbackOrchestrator |  (limiter, breaker, backoff)
//! +----------------------+
//!          |
//!          v
//! +------------------+
//! | HistoryProvider  |  (Yahoo, Stooq, Eastmoney, ...)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |  ProviderResult  |  (Series or Empty(reason))
//! +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`Ticker`] - Registry symbol with optional market tag
//! - [`TimeSeries`] / [`PricePoint`] - Canonical daily closes
//! - [`HistoryWindow`] - Requested span of history
//! - [`ProviderResult`] - Never-failing fetch outcome
//! - [`MarketDataError`] - Classified reason for an empty result

pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;

pub use errors::{MarketDataError, RetryClass};

pub use models::{
    HistoryWindow, Market, PricePoint, ProviderId, ProviderResult, Ticker, TimeSeries,
    DAYS_PER_YEAR,
};

pub use provider::alltick::{AlltickConfig, AlltickProvider};
pub use provider::alpha_vantage::AlphaVantageProvider;
pub use provider::eastmoney::EastmoneyProvider;
pub use provider::finnhub::FinnhubProvider;
pub use provider::stooq::StooqProvider;
pub use provider::yahoo::YahooProvider;
pub use provider::yahoo_worker::{YahooWorkerConfig, YahooWorkerProvider};
pub use provider::{HistoryProvider, ProviderCapabilities, RateLimit};

pub use registry::{
    AttemptOutcome, BackoffPolicy, ChainPolicy, CircuitBreaker, CircuitBreakerConfig,
    CircuitState, FallbackOrchestrator, FetchDiagnostics, ProviderAttempt, RateLimitConfig,
    RateLimiter, SkipReason,
};
