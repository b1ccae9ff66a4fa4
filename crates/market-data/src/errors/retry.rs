/// Classification for retry policy.
///
/// Used by the fallback orchestrator to decide what to do after a provider
/// comes back empty. The breaker column only applies when a circuit breaker
/// is attached to the orchestrator.
///
/// | Class | Retry same provider? | Try next provider? | Record breaker failure? |
/// |-------|----------------------|--------------------|-------------------------|
/// | `WithBackoff` | Yes, up to the attempt budget | Afterwards | No |
/// | `FailoverWithPenalty` | No | Yes | Yes |
/// | `NextProvider` | No | Yes | No |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Explicit throttle signal. Wait with exponential backoff and jitter,
    /// then call the same provider again. Throttling is per symbol and does
    /// not count against the provider's circuit.
    WithBackoff,

    /// Transport failure or timeout. Move on, and count it against the
    /// provider's circuit so a dead upstream stops being called for a while.
    FailoverWithPenalty,

    /// The provider had nothing useful for this symbol but is healthy.
    NextProvider,
}
