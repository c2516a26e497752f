//! Yahoo Finance chart API client
//!
//! Fetches daily bars from `/v8/finance/chart/{ticker}` and keeps the
//! adjusted close of each session. Sessions with a null close are dropped.

use super::{DataProvider, ProviderError};
use crate::config::ProviderConfig;
use crate::prices::{PricePoint, PriceSeries};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;

/// Chart API response envelope
#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartApiError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    /// Session open times (unix seconds)
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Daily price provider backed by the Yahoo Finance chart endpoint
pub struct YahooChartProvider {
    base_url: Url,
    client: Client,
}

impl YahooChartProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://query1.finance.yahoo.com";

    /// Create a client from provider settings
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ProviderError::InvalidBaseUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::InvalidBaseUrl(config.base_url.clone()));
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { base_url, client })
    }

    /// URL of the chart resource for a ticker, path segment escaped
    fn chart_url(&self, ticker: &str) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", ticker]);
        Ok(url)
    }
}

#[async_trait]
impl DataProvider for YahooChartProvider {
    async fn fetch_daily_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, ProviderError> {
        if start >= end {
            return Err(ProviderError::EmptyRange { start, end });
        }

        let url = self.chart_url(ticker)?;
        let period1 = unix_midnight(start).to_string();
        let period2 = unix_midnight(end).to_string();

        tracing::debug!(url = %url, %start, %end, "Fetching daily prices");

        let response = self
            .client
            .get(url)
            .query(&[
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("interval", "1d"),
                ("events", "div,splits"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // Unknown tickers come back as 404 with an error object in the body
        match parse_chart(ticker, &body) {
            Ok(series) if status.is_success() => {
                tracing::debug!(ticker, sessions = series.len(), "Fetched daily prices");
                Ok(series)
            }
            Ok(_) | Err(ProviderError::Malformed(_)) if !status.is_success() => {
                Err(ProviderError::Status {
                    status: status.as_u16(),
                    body: truncate(&body, 200),
                })
            }
            other => other,
        }
    }
}

fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Decode a chart API body into a price series
fn parse_chart(ticker: &str, body: &str) -> Result<PriceSeries, ProviderError> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;

    if let Some(error) = envelope.chart.error {
        if error.code == "Not Found" {
            return Err(ProviderError::UnknownTicker(ticker.to_string()));
        }
        return Err(ProviderError::Api {
            code: error.code,
            description: error.description,
        });
    }

    let result = match envelope.chart.result.and_then(|r| r.into_iter().next()) {
        Some(result) => result,
        None => return Ok(PriceSeries::empty()),
    };

    let closes = match result.indicators.adjclose.into_iter().next() {
        Some(adj) if !adj.adjclose.is_empty() => adj.adjclose,
        _ => result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default(),
    };

    if closes.len() != result.timestamp.len() {
        return Err(ProviderError::Malformed(format!(
            "{} timestamps but {} closes",
            result.timestamp.len(),
            closes.len()
        )));
    }

    let mut points: Vec<PricePoint> = Vec::with_capacity(closes.len());
    for (ts, close) in result.timestamp.iter().zip(closes) {
        let Some(price) = close else {
            continue;
        };
        let date = DateTime::<Utc>::from_timestamp(ts + result.meta.gmtoffset, 0)
            .ok_or_else(|| ProviderError::Malformed(format!("timestamp out of range: {}", ts)))?
            .date_naive();

        // A trailing live bar can share the date of the last session
        match points.last_mut() {
            Some(last) if last.date == date => last.price = price,
            _ => points.push(PricePoint::new(date, price)),
        }
    }

    Ok(PriceSeries::new(points)?)
}
