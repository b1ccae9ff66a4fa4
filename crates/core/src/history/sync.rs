//! Batch history sync.
//!
//! Each symbol runs through the same state machine:
//!
//! ```text
//! CHECK_COVERAGE -> SUFFICIENT                      (skip, no network)
//! CHECK_COVERAGE -> INSUFFICIENT -> ACQUIRE -> MERGE -> PERSIST
//!                                     |
//!                                     +-> empty -> SKIP_NO_DATA (nothing written)
//! ```
//!
//! Symbols are independent and run on a bounded pool; provider attempts for
//! one symbol are sequential inside the orchestrator. A storage failure only
//! fails its own symbol.

use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use tickerbook_market_data::{ProviderId, ProviderResult, Ticker};

use super::client::HistoryClient;
use super::coverage::{cutoff_date, evaluate};
use super::merge::merge_with_stats;
use super::provider_settings::SyncSettings;
use super::store::SeriesStore;

// =============================================================================
// Sync Result Types
// =============================================================================

/// What happened to one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolOutcome {
    /// Stored series already covers the retention window.
    Sufficient { points: usize },
    /// Fresh points were merged and the record was written.
    Persisted {
        source: ProviderId,
        points: usize,
        added: usize,
    },
    /// No provider returned data. Any stored record was left untouched.
    SkippedNoData,
    /// Writing the merged record failed.
    Failed(String),
}

impl SymbolOutcome {
    /// Whether this symbol went to the providers.
    pub fn hit_network(&self) -> bool {
        !matches!(self, SymbolOutcome::Sufficient { .. })
    }
}

impl fmt::Display for SymbolOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sufficient { points } => write!(f, "sufficient ({} points)", points),
            Self::Persisted {
                source,
                points,
                added,
            } => write!(f, "persisted {} points (+{}) from {}", points, added, source),
            Self::SkippedNoData => write!(f, "no data"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Outcome for one symbol of a batch.
#[derive(Debug, Clone)]
pub struct SymbolReport {
    pub symbol: String,
    pub outcome: SymbolOutcome,
}

/// Aggregate result of a batch, in registry order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub sufficient: usize,
    pub persisted: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Points added across all persisted symbols.
    pub points_added: usize,
    pub symbols: Vec<SymbolReport>,
}

impl BatchReport {
    fn add(&mut self, report: SymbolReport) {
        match &report.outcome {
            SymbolOutcome::Sufficient { .. } => self.sufficient += 1,
            SymbolOutcome::Persisted { added, .. } => {
                self.persisted += 1;
                self.points_added += added;
            }
            SymbolOutcome::SkippedNoData => self.skipped += 1,
            SymbolOutcome::Failed(_) => self.failed += 1,
        }
        self.symbols.push(report);
    }

    pub fn total(&self) -> usize {
        self.symbols.len()
    }

    /// Check if no symbol failed to persist.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn outcome_for(&self, symbol: &str) -> Option<&SymbolOutcome> {
        self.symbols
            .iter()
            .find(|r| r.symbol == symbol)
            .map(|r| &r.outcome)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} symbols: {} persisted (+{} points), {} sufficient, {} without data, {} failed",
            self.total(),
            self.persisted,
            self.points_added,
            self.sufficient,
            self.skipped,
            self.failed
        )
    }
}

// =============================================================================
// HistorySyncService
// =============================================================================

pub struct HistorySyncService<S: SeriesStore> {
    store: Arc<S>,
    client: Arc<HistoryClient>,
    settings: SyncSettings,
}

impl<S: SeriesStore> HistorySyncService<S> {
    pub fn new(store: Arc<S>, client: Arc<HistoryClient>, settings: SyncSettings) -> Self {
        Self {
            store,
            client,
            settings,
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Run every ticker through the state machine.
    ///
    /// At most `concurrency` symbols are in flight. The report lists symbols
    /// in the order given, whatever order they finished in.
    pub async fn sync(&self, tickers: &[Ticker]) -> BatchReport {
        let today = Utc::now().date_naive();
        let total = tickers.len();
        let width = self.settings.concurrency.max(1);
        info!(
            "Syncing {} symbols ({} at a time, {} year retention)",
            total, width, self.settings.retention_years
        );

        let mut finished: Vec<(usize, SymbolReport)> = stream::iter(tickers.iter().enumerate())
            .map(|(index, ticker)| async move {
                info!("({}/{}) {}", index + 1, total, ticker);
                let outcome = self.sync_symbol_on(ticker, today).await;

                if outcome.hit_network() && !self.settings.symbol_delay.is_zero() {
                    tokio::time::sleep(self.settings.symbol_delay).await;
                }

                let report = SymbolReport {
                    symbol: ticker.symbol.clone(),
                    outcome,
                };
                (index, report)
            })
            .buffer_unordered(width)
            .collect()
            .await;

        finished.sort_by_key(|(index, _)| *index);

        let mut report = BatchReport::default();
        for (_, symbol_report) in finished {
            report.add(symbol_report);
        }
        info!("Sync finished: {}", report.summary());
        report
    }

    /// Run one ticker through the state machine.
    pub async fn sync_symbol(&self, ticker: &Ticker) -> SymbolOutcome {
        self.sync_symbol_on(ticker, Utc::now().date_naive()).await
    }

    async fn sync_symbol_on(&self, ticker: &Ticker, today: NaiveDate) -> SymbolOutcome {
        let years = self.settings.retention_years;
        let existing = self.store.load(&ticker.symbol).await;

        let coverage = evaluate(&existing, cutoff_date(years, today), today);
        if coverage.is_sufficient() {
            info!(
                "{} already covers {} year(s), skipping fetch (len={})",
                ticker,
                years,
                existing.len()
            );
            return SymbolOutcome::Sufficient {
                points: existing.len(),
            };
        }
        debug!("{} needs history: {}", ticker, coverage);

        let (source, fresh) = match self.client.acquire(ticker, &existing, years).await {
            ProviderResult::Series { source, points } => (source, points),
            ProviderResult::Empty(reason) => {
                if existing.is_empty() {
                    warn!("{} no data from any provider ({}), nothing written", ticker, reason);
                } else {
                    warn!(
                        "{} no fresh data ({}), keeping {} stored points",
                        ticker,
                        reason,
                        existing.len()
                    );
                }
                return SymbolOutcome::SkippedNoData;
            }
        };

        let (merged, stats) = merge_with_stats(&existing, &fresh);
        debug!(
            "{} merged {} fresh into {} existing: +{} added, {} overwritten",
            ticker,
            fresh.len(),
            existing.len(),
            stats.added,
            stats.overwritten
        );

        match self.store.save(&ticker.symbol, &merged).await {
            Ok(()) => {
                info!(
                    "{} wrote len={} source={}",
                    ticker,
                    merged.len(),
                    source
                );
                SymbolOutcome::Persisted {
                    source,
                    points: merged.len(),
                    added: stats.added,
                }
            }
            Err(e) => {
                warn!("{} failed to persist history: {}", ticker, e);
                SymbolOutcome::Failed(e.to_string())
            }
        }
    }

    /// Symbols whose stored series fails the coverage rules, sorted and
    /// de-duplicated. Reads the store only.
    pub async fn stale_symbols(&self, tickers: &[Ticker]) -> Vec<String> {
        let today = Utc::now().date_naive();
        let cutoff = cutoff_date(self.settings.retention_years, today);

        let mut symbols: Vec<&str> = tickers.iter().map(|t| t.symbol.as_str()).collect();
        symbols.sort_unstable();
        symbols.dedup();

        let mut stale = Vec::new();
        for symbol in symbols {
            let series = self.store.load(symbol).await;
            let coverage = evaluate(&series, cutoff, today);
            if !coverage.is_sufficient() {
                debug!("{} is stale: {}", symbol, coverage);
                stale.push(symbol.to_string());
            }
        }
        stale
    }
}
