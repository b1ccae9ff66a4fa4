//! Property-based tests for series construction and merging.
//!
//! Whatever order or duplication the input has, a series must come out with
//! strictly ascending unique dates, and merging must be idempotent and keep
//! every date.

use chrono::{Datelike, Duration, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use tickerbook_core::{merge, merge_with_stats};
use tickerbook_market_data::{PricePoint, TimeSeries};

// =============================================================================
// Generators
// =============================================================================

/// A point within a two-year span, with a close in cents (possibly zero).
fn arb_point() -> impl Strategy<Value = PricePoint> {
    (0i64..730, 0i64..1_000_000).prop_map(|(offset, cents)| {
        let base = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        PricePoint::new(base + Duration::days(offset), Decimal::new(cents, 2))
    })
}

fn arb_points() -> impl Strategy<Value = Vec<PricePoint>> {
    prop::collection::vec(arb_point(), 0..120)
}

fn arb_series() -> impl Strategy<Value = TimeSeries> {
    arb_points().prop_map(TimeSeries::from_points)
}

fn strictly_ascending(series: &TimeSeries) -> bool {
    series.points().windows(2).all(|w| w[0].date < w[1].date)
}

fn dates(series: &TimeSeries) -> BTreeSet<NaiveDate> {
    series.iter().map(|p| p.date).collect()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn series_is_ascending_and_positive(points in arb_points()) {
        let series = TimeSeries::from_points(points);
        prop_assert!(strictly_ascending(&series));
        prop_assert!(series.iter().all(|p| p.close > Decimal::ZERO));
    }

    #[test]
    fn series_keeps_last_close_for_duplicate_dates(points in arb_points()) {
        let series = TimeSeries::from_points(points.clone());
        for point in series.iter() {
            let last = points
                .iter()
                .rev()
                .find(|p| p.date == point.date && p.close > Decimal::ZERO)
                .map(|p| p.close);
            prop_assert_eq!(Some(point.close), last);
        }
    }

    #[test]
    fn merge_is_idempotent(existing in arb_series(), fresh in arb_series()) {
        let once = merge(&existing, &fresh);
        let twice = merge(&once, &fresh);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn merge_never_drops_a_date(existing in arb_series(), fresh in arb_series()) {
        let merged = merge(&existing, &fresh);
        let expected: BTreeSet<NaiveDate> = dates(&existing).union(&dates(&fresh)).copied().collect();
        prop_assert_eq!(dates(&merged), expected);
        prop_assert!(strictly_ascending(&merged));
    }

    #[test]
    fn merge_prefers_fresh_close(existing in arb_series(), fresh in arb_series()) {
        let merged = merge(&existing, &fresh);
        for point in fresh.iter() {
            prop_assert_eq!(merged.close_on(point.date), Some(point.close));
        }
    }

    #[test]
    fn merge_commutes_without_overlap(points in arb_points()) {
        let series = TimeSeries::from_points(points);
        let (left, right): (Vec<PricePoint>, Vec<PricePoint>) = series
            .iter()
            .copied()
            .partition(|p| p.date.day() % 2 == 0);
        let left = TimeSeries::from_points(left);
        let right = TimeSeries::from_points(right);

        prop_assert_eq!(merge(&left, &right), merge(&right, &left));
    }

    #[test]
    fn merge_stats_add_up(existing in arb_series(), fresh in arb_series()) {
        let (merged, stats) = merge_with_stats(&existing, &fresh);
        prop_assert_eq!(stats.total, merged.len());
        prop_assert_eq!(stats.total, existing.len() + stats.added);
        prop_assert!(stats.overwritten <= fresh.len());
    }
}
