use super::series::TimeSeries;
use super::types::ProviderId;
use crate::errors::MarketDataError;

/// Outcome of asking one provider (or a whole chain) for history.
///
/// There is no error path: a provider that fails, times out or has nothing
/// returns [`ProviderResult::Empty`] with the classified reason.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderResult {
    /// Non-empty, ascending series and the provider that produced it.
    Series {
        source: ProviderId,
        points: TimeSeries,
    },
    /// Nothing usable; the reason is kept for backoff decisions and logs.
    Empty(MarketDataError),
}

impl ProviderResult {
    /// Wrap fetched points, downgrading an empty series to `NoDataForRange`.
    pub fn from_points(source: ProviderId, points: TimeSeries) -> Self {
        if points.is_empty() {
            Self::Empty(MarketDataError::NoDataForRange)
        } else {
            Self::Series { source, points }
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty(_))
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Empty(MarketDataError::RateLimited { .. }))
    }

    pub fn source(&self) -> Option<&ProviderId> {
        match self {
            Self::Series { source, .. } => Some(source),
            Self::Empty(_) => None,
        }
    }

    pub fn points(&self) -> Option<&TimeSeries> {
        match self {
            Self::Series { points, .. } => Some(points),
            Self::Empty(_) => None,
        }
    }

    /// Consume into the fetched series, empty when there was none.
    pub fn into_series(self) -> TimeSeries {
        match self {
            Self::Series { points, .. } => points,
            Self::Empty(_) => TimeSeries::new(),
        }
    }

    pub fn empty_reason(&self) -> Option<&MarketDataError> {
        match self {
            Self::Empty(reason) => Some(reason),
            Self::Series { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PricePoint;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::borrow::Cow;

    #[test]
    fn test_empty_points_become_no_data() {
        let result = ProviderResult::from_points(Cow::Borrowed("STOOQ"), TimeSeries::new());
        assert_eq!(result, ProviderResult::Empty(MarketDataError::NoDataForRange));
        assert!(result.source().is_none());
    }

    #[test]
    fn test_series_keeps_source() {
        let points = TimeSeries::from_points(vec![PricePoint::new(
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            dec!(10),
        )]);
        let result = ProviderResult::from_points(Cow::Borrowed("YAHOO"), points.clone());
        assert_eq!(result.source().map(|s| s.as_ref()), Some("YAHOO"));
        assert_eq!(result.into_series(), points);
    }

    #[test]
    fn test_rate_limited_flag() {
        let result = ProviderResult::Empty(MarketDataError::rate_limited("YAHOO"));
        assert!(result.is_rate_limited());
        assert!(result.is_empty());
    }
}
