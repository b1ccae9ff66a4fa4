//! Provider and sync settings.
//!
//! These are plain values filled in by the caller; nothing here reads the
//! environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CONCURRENCY, DEFAULT_RETENTION_YEARS};

/// Credentials and endpoints for the history providers.
///
/// A provider whose credential is missing or blank is not registered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    pub finnhub_api_key: Option<String>,
    pub alpha_vantage_api_key: Option<String>,
    pub alltick_api_key: Option<String>,
    pub alltick_history_url: Option<String>,
    pub yahoo_worker_url: Option<String>,
    pub yahoo_worker_token: Option<String>,
    /// Fixed range label sent to the worker (`1y`, `5y`, ...).
    pub yahoo_worker_range: Option<String>,
    /// Provider ids replacing the built-in default order.
    pub chain_override: Option<Vec<String>>,
}

impl ProviderSettings {
    /// Look up a non-blank value.
    pub(crate) fn non_blank(value: &Option<String>) -> Option<String> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}

/// How a batch runs.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub retention_years: u32,
    /// Symbols processed in parallel.
    pub concurrency: usize,
    /// Pause after each symbol that went to the network.
    pub symbol_delay: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            retention_years: DEFAULT_RETENTION_YEARS,
            concurrency: DEFAULT_CONCURRENCY,
            symbol_delay: Duration::ZERO,
        }
    }
}
