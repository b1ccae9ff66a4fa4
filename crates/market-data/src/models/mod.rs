//! Market data models
//!
//! This module contains the core data types for history acquisition:
//! - `types` - Type aliases for common identifiers (ProviderId)
//! - `ticker` - Registry symbol identity (Ticker) and Market classification
//! - `series` - Canonical daily close series (PricePoint, TimeSeries)
//! - `window` - Requested history span (HistoryWindow)
//! - `result` - Never-failing provider outcome (ProviderResult)

mod result;
mod series;
mod ticker;
mod types;
mod window;

pub use result::ProviderResult;
pub use series::{PricePoint, TimeSeries};
pub use ticker::{Market, Ticker};
pub use types::ProviderId;
pub use window::{HistoryWindow, DAYS_PER_YEAR};
