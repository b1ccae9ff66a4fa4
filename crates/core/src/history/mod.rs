//! History module - coverage, merging, persistence contract and batch sync.
//!
//! # Components
//!
//! - [`coverage`] - decides whether a stored series still satisfies retention
//! - [`merge`] - deduplicating union of stored and fresh points
//! - [`store`] - the [`SeriesStore`] persistence trait
//! - [`client`] - builds the provider set and talks to the orchestrator
//! - [`tickers`] - registry loading and selection
//! - [`sync`] - per-symbol state machine and batch runner

pub mod client;
pub mod coverage;
pub mod merge;
pub mod provider_settings;
pub mod store;
pub mod sync;
pub mod tickers;


pub use client::HistoryClient;
pub use coverage::{cutoff_date, evaluate, sufficient, CoverageReport};
pub use merge::{merge, merge_with_stats, MergeStats};
pub use provider_settings::{ProviderSettings, SyncSettings};
pub use store::SeriesStore;
pub use sync::{BatchReport, HistorySyncService, SymbolOutcome, SymbolReport};
pub use tickers::{load_registry, parse_registry, TickerSelection};
