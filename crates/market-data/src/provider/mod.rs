//! History provider abstractions and implementations.
//!
//! This module contains:
//! - The `HistoryProvider` trait that all adapters implement
//! - Provider capabilities and rate limiting configuration
//! - Concrete adapters, one per upstream source
//!
//! # Architecture
//!
//! Adapters are deliberately isolated from each other and from the chain:
//! - **Self-contained**: every upstream quirk (symbol mapping, payload shape,
//!   in-band throttle notices) stays inside its adapter
//! - **Uniform output**: every adapter produces an ascending [`TimeSeries`](crate::models::TimeSeries)
//! - **Never failing at the boundary**: [`HistoryProvider::fetch`] turns every
//!   error into an empty result with a reason

mod capabilities;
pub(crate) mod http;
mod traits;

pub mod alltick;
pub mod alpha_vantage;
pub mod eastmoney;
pub mod finnhub;
pub mod stooq;
pub mod yahoo;
pub mod yahoo_worker;

// Re-exports
pub use capabilities::{ProviderCapabilities, RateLimit};
pub use traits::HistoryProvider;
