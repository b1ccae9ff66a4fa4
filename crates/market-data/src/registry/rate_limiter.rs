//! Per-provider pacing: token buckets, a minimum request gap, and a
//! cool-down tracker.
//!
//! Every request first waits out any cool-down recorded for its provider,
//! then the provider's minimum gap since its last request, then takes a
//! token from that provider's bucket. One limiter is shared by
//! all workers of a batch, so concurrent symbols pace each other.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::models::ProviderId;
use crate::provider::RateLimit;

/// Default rate limit: 60 requests per minute.
const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

/// Default bucket capacity (allows bursting).
const DEFAULT_BUCKET_CAPACITY: f64 = 5.0;

/// Token bucket for a single provider.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
    /// Tokens per second.
    rate: f64,
    capacity: f64,
}

impl TokenBucket {
    fn new(config: &RateLimitConfig) -> Self {
        let capacity = config.burst_capacity.max(1.0);
        Self {
            tokens: capacity,
            last_update: Instant::now(),
            rate: f64::from(config.requests_per_minute.max(1)) / 60.0,
            capacity,
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_update = now;
    }

    /// Take a token, or report how long until one is available.
    fn take(&mut self) -> Result<(), Duration> {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            Err(Duration::from_secs_f64((1.0 - self.tokens) / self.rate))
        }
    }
}

/// Bucket parameters for one provider.
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub requests_per_minute: u32,
    pub burst_capacity: f64,
    /// Minimum time between two requests to the provider.
    pub min_gap: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            burst_capacity: DEFAULT_BUCKET_CAPACITY,
            min_gap: Duration::ZERO,
        }
    }
}

impl From<&RateLimit> for RateLimitConfig {
    fn from(limit: &RateLimit) -> Self {
        Self {
            requests_per_minute: limit.requests_per_minute,
            burst_capacity: limit.burst.max(1) as f64,
            min_gap: limit.min_delay,
        }
    }
}

#[derive(Default)]
struct LimiterState {
    buckets: HashMap<String, TokenBucket>,
    configs: HashMap<String, RateLimitConfig>,
    cool_downs: HashMap<String, Instant>,
    last_requests: HashMap<String, Instant>,
}

/// Shared rate limiter and cool-down tracker for all providers.
#[derive(Default)]
pub struct RateLimiter {
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the state, recovering from poison. A poisoned limiter only
    /// means slightly off pacing.
    fn lock(&self) -> MutexGuard<'_, LimiterState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Configure the bucket for a provider, resetting any existing one.
    pub fn configure(&self, provider: &ProviderId, config: RateLimitConfig) {
        let mut state = self.lock();
        state.configs.insert(provider.to_string(), config);
        state.buckets.remove(provider.as_ref());
    }

    /// Wait for any cool-down, then the minimum gap, then a token.
    pub async fn acquire(&self, provider: &ProviderId) {
        while let Some(wait) = self.poll(provider) {
            debug!("Rate limiter: waiting {:?} for '{}'", wait, provider);
            tokio::time::sleep(wait).await;
        }
        debug!("Rate limiter: acquired token for '{}'", provider);
    }

    /// One pass of [`acquire`](Self::acquire): `None` once the request may
    /// go out (and is recorded as sent), otherwise how long to wait.
    fn poll(&self, provider: &ProviderId) -> Option<Duration> {
        let mut state = self.lock();
        let now = Instant::now();

        match state.cool_downs.get(provider.as_ref()).copied() {
            Some(until) if until > now => return Some(until - now),
            Some(_) => {
                state.cool_downs.remove(provider.as_ref());
            }
            None => {}
        }

        let min_gap = state
            .configs
            .get(provider.as_ref())
            .map(|config| config.min_gap)
            .unwrap_or_default();
        if let Some(last) = state.last_requests.get(provider.as_ref()) {
            let next = *last + min_gap;
            if next > now {
                return Some(next - now);
            }
        }

        if let Err(wait) = Self::take_token(&mut state, provider) {
            return Some(wait);
        }
        state.last_requests.insert(provider.to_string(), now);
        None
    }

    fn take_token(state: &mut LimiterState, provider: &ProviderId) -> Result<(), Duration> {
        let LimiterState {
            buckets, configs, ..
        } = state;
        buckets
            .entry(provider.to_string())
            .or_insert_with(|| {
                TokenBucket::new(&configs.get(provider.as_ref()).cloned().unwrap_or_default())
            })
            .take()
    }

    /// Block the provider for `duration` from now. An existing, longer
    /// cool-down is kept.
    pub fn start_cool_down(&self, provider: &ProviderId, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        let until = Instant::now() + duration;
        let mut state = self.lock();
        let entry = state
            .cool_downs
            .entry(provider.to_string())
            .or_insert(until);
        if *entry < until {
            *entry = until;
        }
    }

    /// Time left on the provider's cool-down, zero when none is active.
    pub fn cool_down_remaining(&self, provider: &ProviderId) -> Duration {
        let state = self.lock();
        state
            .cool_downs
            .get(provider.as_ref())
            .map(|until| until.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::ZERO)
    }

    /// Drop the bucket, gap and cool-down for a provider.
    pub fn reset(&self, provider: &ProviderId) {
        let mut state = self.lock();
        state.buckets.remove(provider.as_ref());
        state.cool_downs.remove(provider.as_ref());
        state.last_requests.remove(provider.as_ref());
    }
}
