//! Canonical daily close series.
//!
//! Every upstream payload, whatever its native shape, ends up as a
//! [`TimeSeries`] of [`PricePoint`]s. The series type owns the ordering
//! invariant: dates are unique and ascending, and closes are strictly positive.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single end-of-day close.
///
/// Serializes as `{"date": "YYYY-MM-DD", "close": <number>}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: Decimal,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: Decimal) -> Self {
        Self { date, close }
    }

    /// Build a point from a raw float close.
    ///
    /// Returns `None` for NaN, infinities, zero and negative values.
    pub fn from_f64(date: NaiveDate, close: f64) -> Option<Self> {
        if !close.is_finite() || close <= 0.0 {
            return None;
        }
        Decimal::from_f64(close).map(|close| Self { date, close })
    }

    fn is_valid(&self) -> bool {
        self.close > Decimal::ZERO
    }
}

/// Ordered daily series, unique by date, ascending.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TimeSeries {
    points: Vec<PricePoint>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Build a series from points in any order.
    ///
    /// Points with a non-positive close are dropped. When a date appears more
    /// than once, the point supplied last wins.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = PricePoint>,
    {
        let by_date: BTreeMap<NaiveDate, Decimal> = points
            .into_iter()
            .filter(PricePoint::is_valid)
            .map(|p| (p.date, p.close))
            .collect();
        Self::from_map(by_date)
    }

    /// Build a series from a date-keyed map; non-positive closes are dropped.
    pub fn from_map(by_date: BTreeMap<NaiveDate, Decimal>) -> Self {
        Self {
            points: by_date
                .into_iter()
                .map(|(date, close)| PricePoint { date, close })
                .filter(PricePoint::is_valid)
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PricePoint> {
        self.points.iter()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    pub fn close_on(&self, date: NaiveDate) -> Option<Decimal> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|idx| self.points[idx].close)
    }

    /// Keep only points dated on or after `cutoff`.
    pub fn trim_before(mut self, cutoff: NaiveDate) -> Self {
        let start = self.points.partition_point(|p| p.date < cutoff);
        self.points.drain(..start);
        self
    }

    /// Date-to-close view, used by the merge step.
    pub fn to_map(&self) -> BTreeMap<NaiveDate, Decimal> {
        self.points.iter().map(|p| (p.date, p.close)).collect()
    }

    pub fn into_points(self) -> Vec<PricePoint> {
        self.points
    }
}

impl FromIterator<PricePoint> for TimeSeries {
    fn from_iter<I: IntoIterator<Item = PricePoint>>(iter: I) -> Self {
        Self::from_points(iter)
    }
}

impl<'a> IntoIterator for &'a TimeSeries {
    type Item = &'a PricePoint;
    type IntoIter = std::slice::Iter<'a, PricePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

// Records on disk may come from older writers; normalize on the way in.
impl<'de> Deserialize<'de> for TimeSeries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let points = Vec::<PricePoint>::deserialize(deserializer)?;
        Ok(Self::from_points(points))
    }
}
