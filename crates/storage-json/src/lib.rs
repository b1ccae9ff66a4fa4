//! JSON file storage for Tickerbook.
//!
//! Implements [`tickerbook_core::SeriesStore`] with one JSON document per
//! symbol:
//!
//! ```text
//! <root>/
//!   AAPL.json        [{"date":"2024-01-02","close":185.64}, ...]
//!   600519.SS.json
//! ```
//!
//! Records are replaced atomically: each save writes a temporary file in the
//! same directory and renames it over the old record.

pub mod errors;
pub mod series;

pub use errors::StorageError;
pub use series::{JsonSeriesStore, JsonStyle};
