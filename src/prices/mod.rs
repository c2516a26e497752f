//! Historical Price Series
//!
//! Daily closing prices as returned by a data provider.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// One daily observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// Reasons a set of observations cannot form a price series
#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("price on {date} must be positive and finite, got {price}")]
    InvalidPrice { date: NaiveDate, price: f64 },
    #[error("dates must be strictly increasing: {next} follows {prev}")]
    NotIncreasing { prev: NaiveDate, next: NaiveDate },
}

/// Ordered daily prices, dates strictly increasing, prices > 0
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series, rejecting unordered dates or non-positive prices
    pub fn new(points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        for point in &points {
            if !point.price.is_finite() || point.price <= 0.0 {
                return Err(SeriesError::InvalidPrice {
                    date: point.date,
                    price: point.price,
                });
            }
        }

        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(SeriesError::NotIncreasing {
                    prev: pair[0].date,
                    next: pair[1].date,
                });
            }
        }

        Ok(Self { points })
    }

    /// Convenience constructor from parallel (date, price) tuples
    pub fn from_pairs<I>(pairs: I) -> Result<Self, SeriesError>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(date, price)| PricePoint::new(date, price))
                .collect(),
        )
    }

    pub fn empty() -> Self {
        Self::default()
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

    /// First observed price, the anchor of a simulated path
    pub fn first_price(&self) -> Option<f64> {
        self.points.first().map(|p| p.price)
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.price)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    /// Keep only observations with `start <= date < end`
    pub fn within(&self, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            points: self
                .points
                .iter()
                .filter(|p| p.date >= start && p.date < end)
                .copied()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_valid_series() {
        let series = PriceSeries::from_pairs(vec![(day(1), 100.0), (day(4), 101.5)]).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.first_price(), Some(100.0));
        assert_eq!(series.dates().last(), Some(day(4)));
    }

    #[test]
    fn test_rejects_non_positive_price() {
        let err = PriceSeries::from_pairs(vec![(day(1), 100.0), (day(2), 0.0)]).unwrap_err();
        assert_eq!(err, SeriesError::InvalidPrice { date: day(2), price: 0.0 });

        assert!(PriceSeries::from_pairs(vec![(day(1), f64::NAN)]).is_err());
    }

    #[test]
    fn test_rejects_unordered_dates() {
        let err = PriceSeries::from_pairs(vec![(day(2), 100.0), (day(2), 101.0)]).unwrap_err();
        assert_eq!(err, SeriesError::NotIncreasing { prev: day(2), next: day(2) });
    }

    #[test]
    fn test_within_is_end_exclusive() {
        let series =
            PriceSeries::from_pairs(vec![(day(1), 1.0), (day(2), 2.0), (day(3), 3.0)]).unwrap();
        let window = series.within(day(2), day(3));
        assert_eq!(window.prices().collect::<Vec<_>>(), vec![2.0]);
    }

    #[test]
    fn test_empty_series() {
        let series = PriceSeries::empty();
        assert!(series.is_empty());
        assert_eq!(series.first_price(), None);
    }
}
