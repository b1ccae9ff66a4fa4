//! Ticker identity and market classification.
//!
//! A [`Ticker`] is an immutable input supplied by the ticker registry. Its
//! [`Market`] drives two decisions: which providers are tried first, and which
//! providers can serve the symbol at all.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

/// Market or asset class a symbol belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Market {
    /// US-listed equities and ETFs (bare symbols or `.US`).
    Us,
    /// Mainland China A-shares (`.SS` Shanghai, `.SZ` Shenzhen).
    Cn,
    Crypto,
    Fx,
    Commodity,
    Index,
    /// Any other exchange, identified by its upper-cased suffix or tag.
    Other(Arc<str>),
}

impl Market {
    /// Parse a registry market tag (`"US"`, `"CN"`, `"CRYPTO"`, ...).
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_ascii_uppercase();
        if tag.is_empty() {
            return None;
        }
        Some(match tag.as_str() {
            "US" => Market::Us,
            "CN" => Market::Cn,
            "CRYPTO" => Market::Crypto,
            "FX" | "FOREX" => Market::Fx,
            "COM" => Market::Commodity,
            "IDX" => Market::Index,
            other => Market::Other(Arc::from(other)),
        })
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Market::Us => write!(f, "US"),
            Market::Cn => write!(f, "CN"),
            Market::Crypto => write!(f, "CRYPTO"),
            Market::Fx => write!(f, "FX"),
            Market::Commodity => write!(f, "COM"),
            Market::Index => write!(f, "IDX"),
            Market::Other(code) => write!(f, "{}", code),
        }
    }
}

lazy_static! {
    /// Exchange suffixes with a dedicated market classification.
    static ref SUFFIX_MARKETS: HashMap<&'static str, Market> = {
        let mut m = HashMap::new();
        m.insert("SS", Market::Cn);
        m.insert("SZ", Market::Cn);
        m.insert("US", Market::Us);
        m
    };
}

/// A symbol from the ticker registry, with optional market metadata.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,
}

impl Ticker {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            market: None,
        }
    }

    pub fn with_market(symbol: impl Into<String>, market: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            market: Some(market.into()),
        }
    }

    /// Exchange suffix after the last `.`, if any (e.g. `SS` for `600519.SS`).
    pub fn suffix(&self) -> Option<&str> {
        self.symbol
            .rsplit_once('.')
            .map(|(_, suffix)| suffix)
            .filter(|s| !s.is_empty())
    }

    /// Symbol with any exchange suffix removed (`600519.SS` -> `600519`).
    pub fn base_symbol(&self) -> &str {
        match self.symbol.rsplit_once('.') {
            Some((base, _)) if !base.is_empty() => base,
            _ => &self.symbol,
        }
    }

    /// Effective market: the registry tag when present, otherwise derived
    /// from the symbol shape.
    pub fn market(&self) -> Market {
        if let Some(market) = self.market.as_deref().and_then(Market::from_tag) {
            return market;
        }

        if self.symbol.starts_with('^') {
            return Market::Index;
        }
        if self.symbol.ends_with("=X") {
            return Market::Fx;
        }

        match self.suffix() {
            Some(suffix) => {
                let upper = suffix.to_ascii_uppercase();
                SUFFIX_MARKETS
                    .get(upper.as_str())
                    .cloned()
                    .unwrap_or_else(|| Market::Other(Arc::from(upper.as_str())))
            }
            None => Market::Us,
        }
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}
