//! Per-provider circuit breaker.
//!
//! A provider that keeps failing at the transport level is skipped for the
//! rest of a batch instead of costing every remaining symbol a timeout.
//! Attached to the orchestrator only on request. States:
//!
//! - **Closed**: calls go through.
//! - **Open**: calls are skipped until the recovery timeout elapses.
//! - **HalfOpen**: calls go through; one failure reopens, enough successes close.
//!
//! State lives in memory for the lifetime of the process.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::models::ProviderId;

/// Consecutive failures that open a circuit.
const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// How long an open circuit skips its provider.
const DEFAULT_RECOVERY_TIMEOUT: Duration = Duration::from_secs(300);

/// Successes in HalfOpen needed to close again.
const HALF_OPEN_SUCCESS_THRESHOLD: u32 = 1;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Open => write!(f, "Open"),
            Self::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub recovery_timeout: Duration,
    pub half_open_success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            recovery_timeout: DEFAULT_RECOVERY_TIMEOUT,
            half_open_success_threshold: HALF_OPEN_SUCCESS_THRESHOLD,
        }
    }
}

#[derive(Debug)]
struct Circuit {
    state: CircuitState,
    failures: u32,
    half_open_successes: u32,
    opened_at: Option<Instant>,
}

impl Circuit {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failures: 0,
            half_open_successes: 0,
            opened_at: None,
        }
    }

    /// Whether a call may go through; moves Open to HalfOpen once the
    /// recovery timeout has passed.
    fn allow(&mut self, config: &CircuitBreakerConfig) -> bool {
        match self.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let recovered = self
                    .opened_at
                    .is_some_and(|at| at.elapsed() >= config.recovery_timeout);
                if recovered {
                    self.state = CircuitState::HalfOpen;
                    self.half_open_successes = 0;
                }
                recovered
            }
        }
    }

    fn on_success(&mut self, config: &CircuitBreakerConfig) {
        match self.state {
            CircuitState::Closed => self.failures = 0,
            CircuitState::HalfOpen => {
                self.half_open_successes += 1;
                if self.half_open_successes >= config.half_open_success_threshold {
                    *self = Circuit::new();
                }
            }
            CircuitState::Open => {}
        }
    }

    fn on_failure(&mut self, config: &CircuitBreakerConfig) {
        self.failures += 1;
        match self.state {
            CircuitState::Closed if self.failures >= config.failure_threshold => {
                self.state = CircuitState::Open;
                self.opened_at = Some(Instant::now());
            }
            CircuitState::HalfOpen => {
                self.state = CircuitState::Open;
                self.opened_at = Some(Instant::now());
                self.half_open_successes = 0;
            }
            _ => {}
        }
    }
}

/// Per-provider circuit breaker, shared by all workers of a batch.
pub struct CircuitBreaker {
    circuits: Mutex<HashMap<String, Circuit>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            circuits: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Lock the circuits, recovering from poison. The worst case is a
    /// slightly stale circuit state.
    fn lock_circuits(&self) -> MutexGuard<'_, HashMap<String, Circuit>> {
        self.circuits.lock().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn is_allowed(&self, provider: &ProviderId) -> bool {
        let mut circuits = self.lock_circuits();
        let circuit = circuits
            .entry(provider.to_string())
            .or_insert_with(Circuit::new);

        let before = circuit.state;
        let allowed = circuit.allow(&self.config);
        if before != circuit.state {
            info!(
                "Circuit breaker: '{}' {} -> {}",
                provider, before, circuit.state
            );
        }
        allowed
    }

    pub fn record_success(&self, provider: &ProviderId) {
        let mut circuits = self.lock_circuits();
        let circuit = circuits
            .entry(provider.to_string())
            .or_insert_with(Circuit::new);

        let before = circuit.state;
        circuit.on_success(&self.config);
        if before != circuit.state {
            info!("Circuit breaker: closing circuit for '{}'", provider);
        }
    }

    pub fn record_failure(&self, provider: &ProviderId) {
        let mut circuits = self.lock_circuits();
        let circuit = circuits
            .entry(provider.to_string())
            .or_insert_with(Circuit::new);

        let before = circuit.state;
        circuit.on_failure(&self.config);
        if before != CircuitState::Open && circuit.state == CircuitState::Open {
            info!(
                "Circuit breaker: opening circuit for '{}' after {} failures",
                provider, circuit.failures
            );
        } else {
            debug!(
                "Circuit breaker: failure for '{}' ({}/{})",
                provider, circuit.failures, self.config.failure_threshold
            );
        }
    }

    pub fn state(&self, provider: &ProviderId) -> CircuitState {
        self.lock_circuits()
            .get(provider.as_ref())
            .map(|c| c.state)
            .unwrap_or(CircuitState::Closed)
    }

    pub fn failure_count(&self, provider: &ProviderId) -> u32 {
        self.lock_circuits()
            .get(provider.as_ref())
            .map(|c| c.failures)
            .unwrap_or(0)
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}
