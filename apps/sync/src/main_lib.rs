use std::sync::Arc;

use anyhow::Context;
use tickerbook_core::{load_registry, BatchReport, HistoryClient, HistorySyncService};
use tickerbook_storage_json::JsonSeriesStore;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

pub fn init_tracing() {
    let log_format =
        std::env::var("TICKERBOOK_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub fn build_service(config: &Config) -> anyhow::Result<HistorySyncService<JsonSeriesStore>> {
    let client = HistoryClient::new(&config.providers).context("Invalid provider settings")?;
    if !client.has_providers() {
        tracing::warn!("No history providers configured");
    }

    let store = JsonSeriesStore::new(&config.out_dir).with_style(config.json_style);
    tracing::info!("History directory: {}", store.root().display());

    Ok(HistorySyncService::new(
        Arc::new(store),
        Arc::new(client),
        config.sync.clone(),
    ))
}

/// Load the registry, report stale symbols and sync the selected slice.
pub async fn run(config: &Config) -> anyhow::Result<BatchReport> {
    let tickers = load_registry(&config.tickers_path).with_context(|| {
        format!(
            "Failed to load ticker registry {}",
            config.tickers_path.display()
        )
    })?;
    let selected = config.selection.apply(tickers);
    if selected.is_empty() {
        tracing::info!("No symbols to process");
        return Ok(BatchReport::default());
    }

    let service = build_service(config)?;

    let stale = service.stale_symbols(&selected).await;
    if stale.is_empty() {
        tracing::info!("All {} selected symbols are covered", selected.len());
    } else {
        tracing::info!(
            "{} of {} symbols need history: {}",
            stale.len(),
            selected.len(),
            stale.join(",")
        );
    }

    Ok(service.sync(&selected).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_empty_selection_does_no_work() {
        let dir = tempfile::tempdir().unwrap();
        let registry = dir.path().join("tickers.json");
        std::fs::write(&registry, r#"[{"symbol":"AAPL"}]"#).unwrap();

        let vars: HashMap<&str, String> = HashMap::from([
            ("TICKERBOOK_TICKERS", registry.display().to_string()),
            ("TICKERBOOK_OUT_DIR", dir.path().join("out").display().to_string()),
            ("TICKERBOOK_SYMBOLS", "MSFT".to_string()),
        ]);
        let config = Config::from_vars(|key| vars.get(key).cloned()).unwrap();

        let report = run(&config).await.unwrap();
        assert_eq!(report.total(), 0);
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_missing_registry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json").display().to_string();
        let config = Config::from_vars(|key| {
            (key == "TICKERBOOK_TICKERS").then(|| missing.clone())
        })
        .unwrap();

        assert!(run(&config).await.is_err());
    }
}
