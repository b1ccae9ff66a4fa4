use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context};
use tickerbook_core::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_CONCURRENCY, DEFAULT_RETENTION_YEARS, MAX_RETENTION_YEARS,
};
use tickerbook_core::{ProviderSettings, SyncSettings, TickerSelection};
use tickerbook_storage_json::JsonStyle;

const DEFAULT_SYMBOL_DELAY_SECS: f64 = 1.5;

pub struct Config {
    pub tickers_path: PathBuf,
    pub out_dir: PathBuf,
    pub selection: TickerSelection,
    pub sync: SyncSettings,
    pub providers: ProviderSettings,
    pub json_style: JsonStyle,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Blank values count as unset.
    pub fn from_vars<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let tickers_path = var("TICKERBOOK_TICKERS").unwrap_or_else(|| "data/tickers.json".into());
        let out_dir = var("TICKERBOOK_OUT_DIR").unwrap_or_else(|| "public/history".into());

        let symbols: Option<HashSet<String>> = var("TICKERBOOK_SYMBOLS")
            .map(|list| split_list(&list).into_iter().collect())
            .filter(|set: &HashSet<String>| !set.is_empty());
        let selection = TickerSelection {
            symbols,
            batch_index: parse(&var, "TICKERBOOK_BATCH_INDEX")?,
            batch_size: parse(&var, "TICKERBOOK_BATCH_SIZE")?
                .filter(|size| *size > 0)
                .unwrap_or(DEFAULT_BATCH_SIZE),
            limit: parse(&var, "TICKERBOOK_LIMIT")?,
        };

        let delay_secs: f64 =
            parse(&var, "TICKERBOOK_SYMBOL_DELAY")?.unwrap_or(DEFAULT_SYMBOL_DELAY_SECS);
        if !delay_secs.is_finite() || delay_secs < 0.0 {
            return Err(anyhow!(
                "Invalid TICKERBOOK_SYMBOL_DELAY: {} (expected seconds >= 0)",
                delay_secs
            ));
        }
        let retention_years: u32 = parse(&var, "TICKERBOOK_RETENTION_YEARS")?
            .filter(|years| *years > 0)
            .unwrap_or(DEFAULT_RETENTION_YEARS);
        if retention_years > MAX_RETENTION_YEARS {
            return Err(anyhow!(
                "Invalid TICKERBOOK_RETENTION_YEARS: {} (expected at most {})",
                retention_years,
                MAX_RETENTION_YEARS
            ));
        }
        let sync = SyncSettings {
            retention_years,
            concurrency: parse(&var, "TICKERBOOK_CONCURRENCY")?
                .filter(|width| *width > 0)
                .unwrap_or(DEFAULT_CONCURRENCY),
            symbol_delay: Duration::from_secs_f64(delay_secs),
        };

        let providers = ProviderSettings {
            finnhub_api_key: var("FINNHUB_API_KEY").or_else(|| var("FINNHUB_TOKEN")),
            alpha_vantage_api_key: var("ALPHAVANTAGE_API_KEY")
                .or_else(|| var("ALPHAVANTAGE_TOKEN")),
            alltick_api_key: var("ALLTICK_API_KEY"),
            alltick_history_url: var("ALLTICK_HISTORY_URL"),
            yahoo_worker_url: var("YAHOO_WORKER_URL"),
            yahoo_worker_token: var("YAHOO_WORKER_TOKEN"),
            yahoo_worker_range: var("YAHOO_WORKER_RANGE"),
            chain_override: var("TICKERBOOK_CHAIN").map(|list| split_list(&list)),
        };

        let json_style = match parse::<usize, _>(&var, "TICKERBOOK_INDENT")? {
            Some(width) if width > 0 => JsonStyle::Indented(width),
            _ => JsonStyle::Compact,
        };

        Ok(Self {
            tickers_path: PathBuf::from(tickers_path),
            out_dir: PathBuf::from(out_dir),
            selection,
            sync,
            providers,
            json_style,
        })
    }
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse<T, F>(var: &F, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|raw| {
            raw.parse::<T>()
                .with_context(|| format!("Invalid {}: {:?}", key, raw))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.tickers_path, PathBuf::from("data/tickers.json"));
        assert_eq!(config.out_dir, PathBuf::from("public/history"));
        assert_eq!(config.sync.retention_years, 1);
        assert_eq!(config.sync.concurrency, 2);
        assert_eq!(config.sync.symbol_delay, Duration::from_millis(1500));
        assert_eq!(config.selection.batch_size, 80);
        assert!(config.selection.symbols.is_none());
        assert_eq!(config.json_style, JsonStyle::Compact);
        assert!(config.providers.finnhub_api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("TICKERBOOK_SYMBOLS", "AAPL, MSFT"),
            ("TICKERBOOK_BATCH_INDEX", "2"),
            ("TICKERBOOK_LIMIT", "5"),
            ("TICKERBOOK_SYMBOL_DELAY", "0"),
            ("TICKERBOOK_CHAIN", "STOOQ,YAHOO"),
            ("TICKERBOOK_INDENT", "2"),
            ("FINNHUB_TOKEN", "tok"),
            ("ALPHAVANTAGE_API_KEY", " "),
        ])
        .unwrap();

        let symbols = config.selection.symbols.unwrap();
        assert!(symbols.contains("AAPL") && symbols.contains("MSFT"));
        assert_eq!(config.selection.batch_index, Some(2));
        assert_eq!(config.selection.limit, Some(5));
        assert!(config.sync.symbol_delay.is_zero());
        assert_eq!(
            config.providers.chain_override,
            Some(vec!["STOOQ".to_string(), "YAHOO".to_string()])
        );
        assert_eq!(config.json_style, JsonStyle::Indented(2));
        assert_eq!(config.providers.finnhub_api_key.as_deref(), Some("tok"));
        assert!(config.providers.alpha_vantage_api_key.is_none());
    }

    #[test]
    fn test_invalid_numbers_are_errors() {
        assert!(config(&[("TICKERBOOK_CONCURRENCY", "many")]).is_err());
        assert!(config(&[("TICKERBOOK_SYMBOL_DELAY", "-1")]).is_err());
    }

    #[test]
    fn test_retention_years_is_capped() {
        let config_ok = config(&[("TICKERBOOK_RETENTION_YEARS", "100")]).unwrap();
        assert_eq!(config_ok.sync.retention_years, 100);
        assert!(config(&[("TICKERBOOK_RETENTION_YEARS", "1000000")]).is_err());
    }
}
