//! Merging stored and freshly fetched points.

use tickerbook_market_data::TimeSeries;

/// What a merge changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Dates present in `fresh` but not in `existing`.
    pub added: usize,
    /// Shared dates whose close changed.
    pub overwritten: usize,
    /// Length of the merged series.
    pub total: usize,
}

/// Union of both series by date. On a shared date the fresh close wins.
pub fn merge(existing: &TimeSeries, fresh: &TimeSeries) -> TimeSeries {
    merge_with_stats(existing, fresh).0
}

/// [`merge`], also counting what changed.
pub fn merge_with_stats(existing: &TimeSeries, fresh: &TimeSeries) -> (TimeSeries, MergeStats) {
    let mut by_date = existing.to_map();
    let mut stats = MergeStats::default();

    for point in fresh {
        match by_date.insert(point.date, point.close) {
            None => stats.added += 1,
            Some(previous) if previous != point.close => stats.overwritten += 1,
            Some(_) => {}
        }
    }

    let merged = TimeSeries::from_map(by_date);
    stats.total = merged.len();
    (merged, stats)
}
