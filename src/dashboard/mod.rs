//! Dashboard recomputation
//!
//! Every change of ticker, lookback or volatility runs one stateless
//! recomputation: fetch history, estimate drift, simulate a GBM path anchored
//! on the first price, and package both series for rendering.

mod figure;

pub use figure::{
    Annotation, Axis, Diagnostics, ErrorInfo, Figure, FigurePayload, Layout, PayloadStatus, Text,
    Trace, ACTUAL_TRACE_NAME, SIMULATED_TRACE_NAME,
};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::calendar::{DateRange, LookbackWindow};
use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::estimator::{self, ReturnEstimate};
use crate::prices::PriceSeries;
use crate::provider::{DataProvider, ProviderError};
use crate::simulation::{simulate_path, GaussianNoise, NormalSource, SimulatedPath};

pub const VOLATILITY_MIN: f64 = 0.01;
pub const VOLATILITY_MAX: f64 = 1.0;
pub const VOLATILITY_STEP: f64 = 0.01;

const MAX_TICKER_LEN: usize = 16;

/// Validated control values
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardInputs {
    /// Upper-cased symbol
    pub ticker: String,
    pub lookback: LookbackWindow,
    pub volatility: f64,
}

impl DashboardInputs {
    pub fn new(ticker: &str, lookback_days: u32, volatility: f64) -> Result<Self, DashboardError> {
        let ticker = validate_ticker(ticker).map_err(DashboardError::InvalidInput)?;
        let lookback =
            LookbackWindow::try_from(lookback_days).map_err(DashboardError::InvalidInput)?;
        let volatility = validate_volatility(volatility).map_err(DashboardError::InvalidInput)?;
        Ok(Self {
            ticker,
            lookback,
            volatility,
        })
    }
}

/// Control values as received from the page; absent fields take defaults
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawInputs {
    pub ticker: Option<String>,
    pub lookback: Option<String>,
    pub volatility: Option<String>,
    pub seed: Option<String>,
}

/// Inputs plus the seed that drives the random stream
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardRequest {
    pub inputs: DashboardInputs,
    pub seed: Option<u64>,
}

impl RawInputs {
    pub fn resolve(&self, defaults: &DashboardConfig) -> Result<DashboardRequest, DashboardError> {
        let ticker = self.ticker.as_deref().unwrap_or(&defaults.default_ticker);

        let lookback_days = match self.lookback.as_deref().map(str::trim) {
            Some(text) => text.parse::<u32>().map_err(|_| {
                DashboardError::InvalidInput(format!("lookback must be a number of days, got {:?}", text))
            })?,
            None => defaults.default_lookback.days(),
        };

        let volatility = match self.volatility.as_deref().map(str::trim) {
            Some(text) => text.parse::<f64>().map_err(|_| {
                DashboardError::InvalidInput(format!("volatility must be a number, got {:?}", text))
            })?,
            None => defaults.default_volatility,
        };

        let seed = match self.seed.as_deref().map(str::trim) {
            Some("") | None => defaults.seed,
            Some(text) => Some(text.parse::<u64>().map_err(|_| {
                DashboardError::InvalidInput(format!("seed must be an unsigned integer, got {:?}", text))
            })?),
        };

        Ok(DashboardRequest {
            inputs: DashboardInputs::new(ticker, lookback_days, volatility)?,
            seed,
        })
    }

    /// Best-effort title for error payloads
    fn display_ticker(&self) -> String {
        self.ticker
            .as_deref()
            .map(|t| t.trim().to_uppercase())
            .unwrap_or_default()
    }
}

/// Trim and upper-case a ticker symbol, rejecting anything a symbol can't be
pub fn validate_ticker(ticker: &str) -> Result<String, String> {
    let ticker = ticker.trim();
    if ticker.is_empty() {
        return Err("ticker must not be empty".to_string());
    }
    if ticker.len() > MAX_TICKER_LEN {
        return Err(format!("ticker longer than {} characters", MAX_TICKER_LEN));
    }
    if let Some(c) = ticker
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=')))
    {
        return Err(format!("ticker contains invalid character {:?}", c));
    }
    Ok(ticker.to_ascii_uppercase())
}

/// Volatility must lie within the slider range
pub fn validate_volatility(volatility: f64) -> Result<f64, String> {
    if !volatility.is_finite() || !(VOLATILITY_MIN..=VOLATILITY_MAX).contains(&volatility) {
        return Err(format!(
            "volatility must be between {:.2} and {:.2}, got {}",
            VOLATILITY_MIN, VOLATILITY_MAX, volatility
        ));
    }
    Ok(volatility)
}

/// Result of one successful recomputation
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub inputs: DashboardInputs,
    pub range: DateRange,
    pub actual: PriceSeries,
    pub estimate: ReturnEstimate,
    pub simulated: SimulatedPath,
}

/// Fetch, estimate and simulate for one set of inputs
pub async fn recompute<P, N>(
    provider: &P,
    inputs: &DashboardInputs,
    today: NaiveDate,
    normals: &mut N,
) -> Result<Dashboard, DashboardError>
where
    P: DataProvider + ?Sized,
    N: NormalSource + ?Sized,
{
    let range = inputs.lookback.range_ending(today);
    let unavailable = || DashboardError::DataUnavailable {
        ticker: inputs.ticker.clone(),
        start: range.start,
        end: range.end,
    };

    let actual = match provider
        .fetch_daily_prices(&inputs.ticker, range.start, range.end)
        .await
    {
        Ok(series) => series,
        Err(ProviderError::UnknownTicker(_)) | Err(ProviderError::EmptyRange { .. }) => {
            return Err(unavailable())
        }
        Err(e) => return Err(DashboardError::Provider(e)),
    };

    let anchor = actual.first_price().ok_or_else(unavailable)?;

    let estimate = estimator::estimate(&actual);
    let params = estimate.parameters(inputs.volatility);
    let simulated = simulate_path(anchor, actual.len(), &params, normals)?;

    tracing::debug!(
        ticker = %inputs.ticker,
        sessions = actual.len(),
        drift = estimate.annualized_drift,
        historical_volatility = ?estimate.historical_volatility,
        volatility = inputs.volatility,
        "Recomputed simulation"
    );

    Ok(Dashboard {
        inputs: inputs.clone(),
        range,
        actual,
        estimate,
        simulated,
    })
}

/// Recompute the figure for raw control values. Never fails: errors become
/// an annotated empty figure.
pub async fn update_figure<P>(
    provider: &P,
    raw: &RawInputs,
    defaults: &DashboardConfig,
    today: NaiveDate,
) -> FigurePayload
where
    P: DataProvider + ?Sized,
{
    let request = match raw.resolve(defaults) {
        Ok(request) => request,
        Err(e) => {
            tracing::info!(error = %e, "Rejected dashboard inputs");
            return FigurePayload::failure(&raw.display_ticker(), &e);
        }
    };

    let mut normals = match request.seed {
        Some(seed) => GaussianNoise::seeded(seed),
        None => GaussianNoise::from_entropy(),
    };

    match recompute(provider, &request.inputs, today, &mut normals).await {
        Ok(dashboard) => {
            let payload = FigurePayload::success(&dashboard, request.seed);
            for warning in &payload.warnings {
                tracing::warn!(ticker = %request.inputs.ticker, "{}", warning);
            }
            payload
        }
        Err(e) => {
            tracing::warn!(ticker = %request.inputs.ticker, kind = e.kind(), error = %e, "Recomputation failed");
            FigurePayload::failure(&request.inputs.ticker, &e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StaticProvider;
    use crate::simulation::ScriptedNormals;
    use async_trait::async_trait;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()
    }

    /// Four sessions ending the day before `today`
    fn scenario_provider() -> StaticProvider {
        let series = PriceSeries::from_pairs(vec![
            (today() - Duration::days(4), 100.0),
            (today() - Duration::days(3), 102.0),
            (today() - Duration::days(2), 101.0),
            (today() - Duration::days(1), 105.0),
        ])
        .unwrap();
        StaticProvider::new().with_series("TEST", series)
    }

    struct FailingProvider;

    #[async_trait]
    impl DataProvider for FailingProvider {
        async fn fetch_daily_prices(
            &self,
            _ticker: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<PriceSeries, ProviderError> {
            Err(ProviderError::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
        }
    }

    #[test]
    fn test_validate_ticker() {
        assert_eq!(validate_ticker(" aapl "), Ok("AAPL".to_string()));
        assert_eq!(validate_ticker("brk-b"), Ok("BRK-B".to_string()));
        assert_eq!(validate_ticker("^gspc"), Ok("^GSPC".to_string()));
        assert!(validate_ticker("").is_err());
        assert!(validate_ticker("AA PL").is_err());
        assert!(validate_ticker("ABCDEFGHIJKLMNOPQ").is_err());
    }

    #[test]
    fn test_validate_volatility() {
        assert!(validate_volatility(0.01).is_ok());
        assert!(validate_volatility(1.0).is_ok());
        assert!(validate_volatility(0.0).is_err());
        assert!(validate_volatility(1.01).is_err());
        assert!(validate_volatility(f64::NAN).is_err());
    }

    #[test]
    fn test_raw_inputs_defaults() {
        let request = RawInputs::default().resolve(&DashboardConfig::default()).unwrap();
        assert_eq!(request.inputs.ticker, "AAPL");
        assert_eq!(request.inputs.lookback, LookbackWindow::OneYear);
        assert_eq!(request.inputs.volatility, 0.20);
        assert_eq!(request.seed, None);
    }

    #[test]
    fn test_raw_inputs_rejects_bad_values() {
        let defaults = DashboardConfig::default();
        let raw = RawInputs {
            lookback: Some("90".to_string()),
            ..RawInputs::default()
        };
        assert!(matches!(raw.resolve(&defaults), Err(DashboardError::InvalidInput(_))));

        let raw = RawInputs {
            volatility: Some("high".to_string()),
            ..RawInputs::default()
        };
        assert!(matches!(raw.resolve(&defaults), Err(DashboardError::InvalidInput(_))));
    }

    #[actix_web::test]
    async fn test_recompute_scenario() {
        let inputs = DashboardInputs::new("test", 5, 0.2).unwrap();
        let mut normals = ScriptedNormals::new(vec![0.0]);

        let dashboard = recompute(&scenario_provider(), &inputs, today(), &mut normals)
            .await
            .unwrap();

        assert_eq!(dashboard.actual.len(), 4);
        assert_eq!(dashboard.simulated.len(), 4);
        assert_eq!(dashboard.simulated.prices()[0], 100.0);
        assert_eq!(dashboard.estimate.daily_returns.len(), 3);
        assert!((dashboard.estimate.annualized_drift - 4.18).abs() < 0.01);

        // zero draws leave only the drift
        let expected = [100.0, 101.68, 103.39, 105.13];
        for (got, want) in dashboard.simulated.prices().iter().zip(expected) {
            assert!((got - want).abs() < 0.05);
        }
    }

    #[actix_web::test]
    async fn test_recompute_fixed_stream_is_deterministic() {
        let inputs = DashboardInputs::new("TEST", 30, 0.5).unwrap();
        let draws = vec![0.4, -1.1, 1.7];

        let a = recompute(&scenario_provider(), &inputs, today(), &mut ScriptedNormals::new(draws.clone()))
            .await
            .unwrap();
        let b = recompute(&scenario_provider(), &inputs, today(), &mut ScriptedNormals::new(draws))
            .await
            .unwrap();
        assert_eq!(a.simulated, b.simulated);
    }

    #[actix_web::test]
    async fn test_empty_series_is_data_unavailable() {
        let provider = StaticProvider::new().with_series("EMPTY", PriceSeries::empty());
        let inputs = DashboardInputs::new("EMPTY", 252, 0.2).unwrap();

        let err = recompute(&provider, &inputs, today(), &mut ScriptedNormals::new(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::DataUnavailable { .. }));
    }

    #[actix_web::test]
    async fn test_unknown_ticker_is_data_unavailable() {
        let inputs = DashboardInputs::new("NOPE", 252, 0.2).unwrap();
        let err = recompute(&scenario_provider(), &inputs, today(), &mut ScriptedNormals::new(vec![]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "data_unavailable");
    }

    #[actix_web::test]
    async fn test_single_session() {
        let series = PriceSeries::from_pairs(vec![(today() - Duration::days(1), 50.0)]).unwrap();
        let provider = StaticProvider::new().with_series("ONE", series);
        let inputs = DashboardInputs::new("ONE", 5, 0.2).unwrap();

        let dashboard = recompute(&provider, &inputs, today(), &mut ScriptedNormals::new(vec![1.0]))
            .await
            .unwrap();
        assert_eq!(dashboard.simulated.prices(), &[50.0]);
        assert_eq!(dashboard.estimate.annualized_drift, 0.0);

        let payload = FigurePayload::success(&dashboard, None);
        assert_eq!(payload.warnings.len(), 1);
    }

    /// Two sessions whose single return overflows to an infinite drift
    fn overflowing_provider() -> StaticProvider {
        let series = PriceSeries::from_pairs(vec![
            (today() - Duration::days(2), 1.0e-300),
            (today() - Duration::days(1), 1.0e300),
        ])
        .unwrap();
        StaticProvider::new().with_series("HUGE", series)
    }

    #[actix_web::test]
    async fn test_infinite_drift_is_simulated() {
        let inputs = DashboardInputs::new("HUGE", 5, 0.2).unwrap();
        let dashboard = recompute(&overflowing_provider(), &inputs, today(), &mut ScriptedNormals::new(vec![0.0]))
            .await
            .unwrap();

        assert_eq!(dashboard.estimate.annualized_drift, f64::INFINITY);
        assert_eq!(dashboard.simulated.prices(), &[1.0e-300, f64::INFINITY]);
        assert_eq!(dashboard.simulated.non_finite_count(), 1);
    }

    #[actix_web::test]
    async fn test_non_finite_path_payload() {
        let raw = RawInputs {
            ticker: Some("HUGE".to_string()),
            lookback: Some("5".to_string()),
            seed: Some("3".to_string()),
            ..RawInputs::default()
        };
        let payload =
            update_figure(&overflowing_provider(), &raw, &DashboardConfig::default(), today()).await;

        assert!(payload.is_ok());
        assert!(payload.error.is_none());
        assert_eq!(payload.warnings.len(), 1);
        assert!(payload.warnings[0].contains("1 non-finite"));

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["figure"]["data"][1]["y"][0], 1.0e-300);
        assert!(json["figure"]["data"][1]["y"][1].is_null());
        assert_eq!(json["figure"]["data"][0]["y"][1], 1.0e300);
    }

    #[actix_web::test]
    async fn test_update_figure_success_payload() {
        let raw = RawInputs {
            ticker: Some("test".to_string()),
            lookback: Some("30".to_string()),
            volatility: Some("0.25".to_string()),
            seed: Some("42".to_string()),
        };
        let payload =
            update_figure(&scenario_provider(), &raw, &DashboardConfig::default(), today()).await;

        assert!(payload.is_ok());
        assert_eq!(payload.figure.data.len(), 2);
        assert_eq!(payload.figure.data[0].name, ACTUAL_TRACE_NAME);
        assert_eq!(payload.figure.data[1].name, SIMULATED_TRACE_NAME);
        assert_eq!(payload.figure.data[0].x, payload.figure.data[1].x);
        assert_eq!(payload.figure.data[1].y[0], 100.0);
        assert_eq!(payload.figure.layout.title.text, "GBM Simulation for TEST");

        let diagnostics = payload.diagnostics.unwrap();
        assert_eq!(diagnostics.sessions, 4);
        assert_eq!(diagnostics.weekdays, 22);
        assert_eq!(diagnostics.volatility, 0.25);
        assert_eq!(diagnostics.seed, Some(42));
        assert!(diagnostics.historical_volatility.is_some());
    }

    #[actix_web::test]
    async fn test_update_figure_same_seed_same_path() {
        let raw = RawInputs {
            ticker: Some("TEST".to_string()),
            seed: Some("7".to_string()),
            ..RawInputs::default()
        };
        let defaults = DashboardConfig::default();
        let a = update_figure(&scenario_provider(), &raw, &defaults, today()).await;
        let b = update_figure(&scenario_provider(), &raw, &defaults, today()).await;
        assert_eq!(a.figure.data[1].y, b.figure.data[1].y);
    }

    #[actix_web::test]
    async fn test_update_figure_recovers_errors() {
        let defaults = DashboardConfig::default();

        let empty = StaticProvider::new().with_series("AAPL", PriceSeries::empty());
        let payload = update_figure(&empty, &RawInputs::default(), &defaults, today()).await;
        assert!(!payload.is_ok());
        assert_eq!(payload.error.as_ref().unwrap().kind, "data_unavailable");
        assert!(payload.figure.data.is_empty());

        let payload = update_figure(&FailingProvider, &RawInputs::default(), &defaults, today()).await;
        assert_eq!(payload.error.as_ref().unwrap().kind, "provider");

        let raw = RawInputs {
            ticker: Some("".to_string()),
            ..RawInputs::default()
        };
        let payload = update_figure(&scenario_provider(), &raw, &defaults, today()).await;
        assert_eq!(payload.error.as_ref().unwrap().kind, "invalid_input");
    }
}
