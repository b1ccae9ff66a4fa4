//! Coverage rules for stored series.
//!
//! A stored series is good enough when it is non-empty, has at least
//! [`MIN_POINTS`] points, starts on or before the retention cutoff and its
//! last point is at most [`FRESHNESS_DAYS`] calendar days old.

use std::fmt;

use chrono::NaiveDate;
use tickerbook_market_data::{HistoryWindow, TimeSeries};

use crate::constants::{FRESHNESS_DAYS, MIN_POINTS};

/// Result of checking a series against the coverage rules.
///
/// Only the first failing condition is reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoverageReport {
    Sufficient,
    Empty,
    TooFewPoints {
        points: usize,
    },
    StartsAfterCutoff {
        first: NaiveDate,
        cutoff: NaiveDate,
    },
    Stale {
        last: NaiveDate,
        age_days: i64,
    },
}

impl CoverageReport {
    pub fn is_sufficient(&self) -> bool {
        matches!(self, CoverageReport::Sufficient)
    }
}

impl fmt::Display for CoverageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sufficient => write!(f, "sufficient"),
            Self::Empty => write!(f, "empty"),
            Self::TooFewPoints { points } => {
                write!(f, "too few points ({}/{})", points, MIN_POINTS)
            }
            Self::StartsAfterCutoff { first, cutoff } => {
                write!(f, "starts {} after cutoff {}", first, cutoff)
            }
            Self::Stale { last, age_days } => {
                write!(f, "stale, last point {} ({} days old)", last, age_days)
            }
        }
    }
}

/// Earliest date a series must reach to cover `retention_years` up to `today`.
pub fn cutoff_date(retention_years: u32, today: NaiveDate) -> NaiveDate {
    HistoryWindow::trailing_years(retention_years, today).cutoff()
}

/// Check `series` against the coverage rules.
pub fn evaluate(series: &TimeSeries, cutoff: NaiveDate, today: NaiveDate) -> CoverageReport {
    let (Some(first), Some(last)) = (series.first_date(), series.last_date()) else {
        return CoverageReport::Empty;
    };

    if series.len() < MIN_POINTS {
        return CoverageReport::TooFewPoints {
            points: series.len(),
        };
    }

    if first > cutoff {
        return CoverageReport::StartsAfterCutoff { first, cutoff };
    }

    let age_days = (today - last).num_days();
    if age_days > FRESHNESS_DAYS {
        return CoverageReport::Stale { last, age_days };
    }

    CoverageReport::Sufficient
}

/// Whether `series` already satisfies the retention policy.
pub fn sufficient(series: &TimeSeries, cutoff: NaiveDate, today: NaiveDate) -> bool {
    evaluate(series, cutoff, today).is_sufficient()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use tickerbook_market_data::PricePoint;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    /// `count` consecutive daily points ending on `last`.
    fn daily_series(count: usize, last: NaiveDate) -> TimeSeries {
        TimeSeries::from_points(
            (0..count).map(|i| PricePoint::new(last - Duration::days(i as i64), dec!(10.5))),
        )
    }

    #[test]
    fn test_empty_series_is_insufficient() {
        let today = day("2024-06-30");
        let cutoff = cutoff_date(1, today);
        assert!(!sufficient(&TimeSeries::new(), cutoff, today));
        assert_eq!(
            evaluate(&TimeSeries::new(), cutoff, today),
            CoverageReport::Empty
        );
    }

    #[test]
    fn test_full_fresh_series_is_sufficient() {
        let today = day("2024-06-30");
        let cutoff = cutoff_date(1, today);
        let series = daily_series(400, today - Duration::days(1));
        assert!(sufficient(&series, cutoff, today));
    }

    #[test]
    fn test_too_few_points() {
        let today = day("2024-06-30");
        let cutoff = cutoff_date(1, today);
        let series = daily_series(150, today);
        assert_eq!(
            evaluate(&series, cutoff, today),
            CoverageReport::TooFewPoints { points: 150 }
        );
    }

    #[test]
    fn test_starts_after_cutoff() {
        let today = day("2024-06-30");
        // 250 points ending today start well after a one-year cutoff
        let series = daily_series(250, today);
        let report = evaluate(&series, cutoff_date(1, today), today);
        assert!(matches!(report, CoverageReport::StartsAfterCutoff { .. }));
    }

    #[test]
    fn test_freshness_boundary() {
        let today = day("2024-06-30");
        let cutoff = cutoff_date(1, today);

        let three_days_old = daily_series(400, today - Duration::days(3));
        assert!(sufficient(&three_days_old, cutoff, today));

        let four_days_old = daily_series(400, today - Duration::days(4));
        assert_eq!(
            evaluate(&four_days_old, cutoff, today),
            CoverageReport::Stale {
                last: today - Duration::days(4),
                age_days: 4
            }
        );
    }

    #[test]
    fn test_cutoff_scales_with_years() {
        let today = day("2024-06-30");
        assert_eq!(cutoff_date(1, today), day("2023-07-01"));
        assert_eq!(cutoff_date(2, today), today - Duration::days(730));
    }

    #[test]
    fn test_cutoff_for_absurd_retention_does_not_panic() {
        let today = day("2024-06-30");
        assert_eq!(cutoff_date(1_000_000, today), NaiveDate::MIN);
    }
}
