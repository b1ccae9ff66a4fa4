use chrono::{Days, NaiveDate, TimeZone, Utc};

/// Days counted per retention year.
pub const DAYS_PER_YEAR: i64 = 365;

/// Requested span of daily history, anchored at `end` (today).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistoryWindow {
    pub years: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl HistoryWindow {
    /// Trailing window of `years` ending on `today`. Zero years is treated as
    /// one; a span reaching past the calendar starts at `NaiveDate::MIN`.
    pub fn trailing_years(years: u32, today: NaiveDate) -> Self {
        let years = years.max(1);
        let days = DAYS_PER_YEAR.unsigned_abs() * u64::from(years);
        Self {
            years,
            start: today
                .checked_sub_days(Days::new(days))
                .unwrap_or(NaiveDate::MIN),
            end: today,
        }
    }

    /// Window ending on the current UTC date.
    pub fn trailing_from_now(years: u32) -> Self {
        Self::trailing_years(years, Utc::now().date_naive())
    }

    /// Earliest date kept when a source returns more history than requested.
    pub fn cutoff(&self) -> NaiveDate {
        self.start
    }

    /// Unix timestamp at the start of `start` (UTC midnight).
    pub fn start_timestamp(&self) -> i64 {
        Utc.from_utc_datetime(&self.start.and_time(chrono::NaiveTime::MIN))
            .timestamp()
    }

    /// Unix timestamp at the last second of `end` (UTC).
    pub fn end_timestamp(&self) -> i64 {
        self.start_timestamp() + (self.end - self.start).num_seconds() + 86_399
    }

    /// Chart-style range label covering the window: `1y`, `2y`, `5y` or `10y`.
    pub fn range_label(&self) -> &'static str {
        match self.years {
            0 | 1 => "1y",
            2 => "2y",
            3..=5 => "5y",
            _ => "10y",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_trailing_years() {
        let window = HistoryWindow::trailing_years(1, day("2024-06-30"));
        assert_eq!(window.start, day("2023-07-01"));
        assert_eq!(window.end, day("2024-06-30"));
        assert_eq!(window.cutoff(), window.start);
    }

    #[test]
    fn test_zero_years_means_one() {
        let window = HistoryWindow::trailing_years(0, day("2024-06-30"));
        assert_eq!(window.years, 1);
    }

    #[test]
    fn test_huge_retention_clamps_to_min_date() {
        let window = HistoryWindow::trailing_years(1_000_000, day("2024-06-30"));
        assert_eq!(window.start, NaiveDate::MIN);
        assert_eq!(window.end, day("2024-06-30"));

        let window = HistoryWindow::trailing_years(u32::MAX, day("2024-06-30"));
        assert_eq!(window.cutoff(), NaiveDate::MIN);
    }

    #[test]
    fn test_timestamps() {
        let window = HistoryWindow::trailing_years(1, day("2024-01-01"));
        assert_eq!(window.start_timestamp(), 1_672_531_200); // 2023-01-01T00:00:00Z
        assert_eq!(window.end_timestamp(), 1_704_153_599); // 2024-01-01T23:59:59Z
    }

    #[test]
    fn test_range_label() {
        let today = day("2024-01-01");
        assert_eq!(HistoryWindow::trailing_years(1, today).range_label(), "1y");
        assert_eq!(HistoryWindow::trailing_years(2, today).range_label(), "2y");
        assert_eq!(HistoryWindow::trailing_years(4, today).range_label(), "5y");
        assert_eq!(HistoryWindow::trailing_years(12, today).range_label(), "10y");
    }
}
