//! Retry delays for throttled providers.

use std::time::Duration;

use rand::Rng;

/// Exponential backoff with additive jitter.
///
/// The delay before retry `n` (1-based) is `min(base * 2^(n-1), max)` plus a
/// uniform jitter drawn from `jitter`.
#[derive(Clone, Debug)]
pub struct BackoffPolicy {
    /// Total attempts per provider, first call included.
    pub max_attempts: u32,
    pub base: Duration,
    pub max: Duration,
    /// Inclusive jitter range added to every delay.
    pub jitter: (Duration, Duration),
}

impl BackoffPolicy {
    /// Same attempt budget, no waiting. For tests and dry runs.
    pub fn none() -> Self {
        Self {
            max_attempts: 3,
            base: Duration::ZERO,
            max: Duration::ZERO,
            jitter: (Duration::ZERO, Duration::ZERO),
        }
    }

    /// Delay without jitter before retry number `retry` (1-based).
    pub fn base_delay(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(16);
        self.base.saturating_mul(1 << exp).min(self.max)
    }

    /// Delay before retry number `retry` (1-based), jitter included.
    pub fn delay(&self, retry: u32) -> Duration {
        let (low, high) = self.jitter;
        let jitter = if high > low {
            rand::thread_rng().gen_range(low..=high)
        } else {
            low
        };
        self.base_delay(retry) + jitter
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base: Duration::from_secs(15),
            max: Duration::from_secs(60),
            jitter: (Duration::from_secs(1), Duration::from_secs(3)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_delay_doubles_and_caps() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.base_delay(1), Duration::from_secs(15));
        assert_eq!(policy.base_delay(2), Duration::from_secs(30));
        assert_eq!(policy.base_delay(3), Duration::from_secs(60));
        assert_eq!(policy.base_delay(10), Duration::from_secs(60));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let policy = BackoffPolicy::default();
        for _ in 0..50 {
            let delay = policy.delay(1);
            assert!(delay >= Duration::from_secs(16));
            assert!(delay <= Duration::from_secs(18));
        }
    }

    #[test]
    fn test_none_never_waits() {
        let policy = BackoffPolicy::none();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay(2), Duration::ZERO);
    }
}
