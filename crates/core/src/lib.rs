//! Tickerbook Core - coverage rules, merging and batch history sync.
//!
//! This crate decides which symbols need fresh history, asks the market-data
//! orchestrator for it, merges the result into what is already stored and
//! persists it through a [`history::SeriesStore`]. It is storage-agnostic;
//! the `storage-json` crate provides the file-backed store.

pub mod constants;
pub mod errors;
pub mod history;

pub use history::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
