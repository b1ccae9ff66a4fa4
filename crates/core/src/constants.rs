/// Minimum number of points a stored series needs to count as covered.
pub const MIN_POINTS: usize = 200;

/// A series whose last point is older than this many calendar days is stale.
pub const FRESHNESS_DAYS: i64 = 3;

/// Years of history kept per symbol.
pub const DEFAULT_RETENTION_YEARS: u32 = 1;

/// Largest accepted retention setting.
pub const MAX_RETENTION_YEARS: u32 = 100;

/// Symbols synced in parallel.
pub const DEFAULT_CONCURRENCY: usize = 2;

/// Symbols per registry slice.
pub const DEFAULT_BATCH_SIZE: usize = 80;

/// Provider ids
pub const DATA_SOURCE_YAHOO_WORKER: &str = "YAHOO_WORKER";
pub const DATA_SOURCE_YAHOO: &str = "YAHOO";
pub const DATA_SOURCE_FINNHUB: &str = "FINNHUB";
pub const DATA_SOURCE_ALPHA_VANTAGE: &str = "ALPHA_VANTAGE";
pub const DATA_SOURCE_STOOQ: &str = "STOOQ";
pub const DATA_SOURCE_EASTMONEY: &str = "EASTMONEY";
pub const DATA_SOURCE_ALLTICK: &str = "ALLTICK";
