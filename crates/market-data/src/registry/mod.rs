//! Provider orchestration.
//!
//! This module drives the provider chain for a symbol, including:
//! - Chain ordering per market (`ChainPolicy`)
//! - Rate limiting, minimum request gaps and post-success cool-downs per provider
//! - Optional circuit breaking for providers whose transport keeps failing
//! - Exponential backoff with jitter on throttle signals
//! - Per-attempt diagnostics

mod backoff;
mod chain;
mod circuit_breaker;
mod diagnostics;
mod orchestrator;
mod rate_limiter;

pub use backoff::BackoffPolicy;
pub use chain::{ChainPolicy, CN_ORDER, DEFAULT_ORDER};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use diagnostics::{AttemptOutcome, FetchDiagnostics, ProviderAttempt, SkipReason};
pub use orchestrator::FallbackOrchestrator;
pub use rate_limiter::{RateLimitConfig, RateLimiter};
