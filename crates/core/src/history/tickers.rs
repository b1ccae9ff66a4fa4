//! Ticker registry: loading and selecting the symbols of a run.

use std::collections::HashSet;
use std::path::Path;

use log::{debug, info, warn};
use serde_json::Value;
use tickerbook_market_data::Ticker;

use crate::constants::DEFAULT_BATCH_SIZE;
use crate::errors::{Error, Result};

/// Parse a registry document: a JSON array of `{symbol, market?}` objects.
///
/// A leading byte-order mark is accepted. Entries that are not objects or
/// have a blank symbol are skipped; markets are upper-cased.
pub fn parse_registry(text: &str) -> Result<Vec<Ticker>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let document: Value = serde_json::from_str(text)?;
    let Value::Array(entries) = document else {
        return Err(Error::Registry("expected a JSON array of tickers".into()));
    };

    let mut tickers = Vec::with_capacity(entries.len());
    for entry in &entries {
        let Some(object) = entry.as_object() else {
            continue;
        };
        let symbol = object
            .get("symbol")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default();
        if symbol.is_empty() {
            continue;
        }
        let market = object
            .get("market")
            .and_then(Value::as_str)
            .map(|m| m.trim().to_uppercase())
            .filter(|m| !m.is_empty());

        tickers.push(Ticker {
            symbol: symbol.to_string(),
            market,
        });
    }

    let skipped = entries.len() - tickers.len();
    if skipped > 0 {
        debug!("Skipped {} registry entries without a symbol", skipped);
    }
    Ok(tickers)
}

/// Read and parse the registry file at `path`.
pub fn load_registry(path: &Path) -> Result<Vec<Ticker>> {
    let text = std::fs::read_to_string(path)?;
    let tickers = parse_registry(&text)?;
    info!("Loaded {} tickers from {}", tickers.len(), path.display());
    Ok(tickers)
}

/// Which registry entries a run processes.
///
/// Applied in order: symbol filter, batch slice, limit.
#[derive(Debug, Clone)]
pub struct TickerSelection {
    /// Only these symbols, when set.
    pub symbols: Option<HashSet<String>>,
    /// Zero-based slice of `batch_size` entries, when set.
    pub batch_index: Option<usize>,
    pub batch_size: usize,
    /// At most this many symbols.
    pub limit: Option<usize>,
}

impl Default for TickerSelection {
    fn default() -> Self {
        Self {
            symbols: None,
            batch_index: None,
            batch_size: DEFAULT_BATCH_SIZE,
            limit: None,
        }
    }
}

impl TickerSelection {
    /// Selection with a symbol filter built from a comma-separated list.
    pub fn with_symbol_list(mut self, list: &str) -> Self {
        let symbols: HashSet<String> = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        self.symbols = (!symbols.is_empty()).then_some(symbols);
        self
    }

    pub fn apply(&self, mut tickers: Vec<Ticker>) -> Vec<Ticker> {
        if let Some(symbols) = &self.symbols {
            tickers.retain(|t| symbols.contains(&t.symbol));
        }

        if let Some(index) = self.batch_index {
            let size = if self.batch_size > 0 {
                self.batch_size
            } else {
                DEFAULT_BATCH_SIZE
            };
            let total = tickers.len();
            let start = index.saturating_mul(size);
            if start >= total {
                warn!("Batch index {} out of range for {} symbols", index, total);
                return Vec::new();
            }
            let end = start.saturating_add(size).min(total);
            info!(
                "Processing batch {} (symbols {} to {} of {})",
                index,
                start + 1,
                end,
                total
            );
            tickers.truncate(end);
            tickers.drain(..start);
        }

        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            tickers.truncate(limit);
        }

        tickers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tickerbook_market_data::Market;

    fn symbols(tickers: &[Ticker]) -> Vec<&str> {
        tickers.iter().map(|t| t.symbol.as_str()).collect()
    }

    fn numbered(count: usize) -> Vec<Ticker> {
        (0..count).map(|i| Ticker::new(format!("S{}", i))).collect()
    }

    #[test]
    fn test_parse_registry_skips_bad_entries() {
        let text = "\u{feff}[
            {\"symbol\": \"AAPL\"},
            {\"symbol\": \" 600519.SS \", \"market\": \"cn\"},
            {\"symbol\": \"\"},
            {\"name\": \"no symbol\"},
            42
        ]";
        let tickers = parse_registry(text).unwrap();
        assert_eq!(symbols(&tickers), vec!["AAPL", "600519.SS"]);
        assert_eq!(tickers[1].market.as_deref(), Some("CN"));
        assert_eq!(tickers[1].market(), Market::Cn);
    }

    #[test]
    fn test_parse_registry_rejects_non_array() {
        assert!(matches!(
            parse_registry("{\"symbol\": \"AAPL\"}"),
            Err(Error::Registry(_))
        ));
        assert!(matches!(
            parse_registry("not json"),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_load_registry_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[{{\"symbol\": \"MSFT\", \"market\": \"US\"}}]").unwrap();

        let tickers = load_registry(file.path()).unwrap();
        assert_eq!(symbols(&tickers), vec!["MSFT"]);
    }

    #[test]
    fn test_missing_registry_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_registry(&dir.path().join("missing.json")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_symbol_filter() {
        let selection = TickerSelection::default().with_symbol_list("S1, S3,,");
        assert_eq!(symbols(&selection.apply(numbered(5))), vec!["S1", "S3"]);

        let blank = TickerSelection::default().with_symbol_list(" , ");
        assert!(blank.symbols.is_none());
    }

    #[test]
    fn test_batch_slice() {
        let selection = TickerSelection {
            batch_index: Some(1),
            batch_size: 2,
            ..Default::default()
        };
        assert_eq!(symbols(&selection.apply(numbered(5))), vec!["S2", "S3"]);

        let last = TickerSelection {
            batch_index: Some(2),
            batch_size: 2,
            ..Default::default()
        };
        assert_eq!(symbols(&last.apply(numbered(5))), vec!["S4"]);

        let out_of_range = TickerSelection {
            batch_index: Some(3),
            batch_size: 2,
            ..Default::default()
        };
        assert!(out_of_range.apply(numbered(5)).is_empty());
    }

    #[test]
    fn test_limit_after_batch() {
        let selection = TickerSelection {
            batch_index: Some(0),
            batch_size: 4,
            limit: Some(3),
            ..Default::default()
        };
        assert_eq!(
            symbols(&selection.apply(numbered(10))),
            vec!["S0", "S1", "S2"]
        );

        let zero_limit = TickerSelection {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(zero_limit.apply(numbered(3)).len(), 3);
    }
}
