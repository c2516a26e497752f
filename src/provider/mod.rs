//! Historical price providers
//!
//! A provider returns the daily closing prices of one ticker for a half-open
//! date range `[start, end)`.

mod yahoo;

pub use yahoo::YahooChartProvider;

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use thiserror::Error;

use crate::prices::{PriceSeries, SeriesError};

/// Price provider failures
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown ticker: {0}")]
    UnknownTicker(String),
    #[error("empty date range: {start} to {end}")]
    EmptyRange { start: NaiveDate, end: NaiveDate },
    #[error("invalid provider url: {0}")]
    InvalidBaseUrl(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider error {code}: {description}")]
    Api { code: String, description: String },
    #[error("malformed provider response: {0}")]
    Malformed(String),
    #[error("provider returned an invalid series: {0}")]
    InvalidSeries(#[from] SeriesError),
}

/// Source of historical daily prices
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Daily closes for `ticker` with `start <= date < end`
    async fn fetch_daily_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, ProviderError>;
}

/// In-memory provider serving preloaded series
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    series: HashMap<String, PriceSeries>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a series under an (upper-cased) ticker
    pub fn with_series(mut self, ticker: &str, series: PriceSeries) -> Self {
        self.series.insert(ticker.to_uppercase(), series);
        self
    }
}

#[async_trait]
impl DataProvider for StaticProvider {
    async fn fetch_daily_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, ProviderError> {
        if start >= end {
            return Err(ProviderError::EmptyRange { start, end });
        }

        let series = self
            .series
            .get(&ticker.to_uppercase())
            .ok_or_else(|| ProviderError::UnknownTicker(ticker.to_string()))?;

        Ok(series.within(start, end))
    }
}
