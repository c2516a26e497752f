//! Return & Parameter Estimation
//!
//! Turns a historical price series into daily returns and annualized
//! drift / volatility figures.

use crate::prices::PriceSeries;
use crate::simulation::SimulationParameters;

/// Nominal trading days per year used for annualization
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Statistics derived from a price series
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnEstimate {
    /// Fractional daily returns, one fewer than the prices
    pub daily_returns: Vec<f64>,
    /// mean(daily returns) * 252, zero when there are no returns
    pub annualized_drift: f64,
    /// sample stddev(daily returns) * sqrt(252), None with fewer than 2 returns
    pub historical_volatility: Option<f64>,
}

impl ReturnEstimate {
    /// Parameters for the simulator.
    ///
    /// The volatility is the caller's override; the historical estimate is
    /// only reported alongside.
    pub fn parameters(&self, volatility: f64) -> SimulationParameters {
        SimulationParameters::new(self.annualized_drift, volatility)
    }
}

/// Daily fractional returns: price[i] / price[i-1] - 1
pub fn daily_returns(series: &PriceSeries) -> Vec<f64> {
    series
        .points()
        .windows(2)
        .map(|pair| pair[1].price / pair[0].price - 1.0)
        .collect()
}

/// Estimate annualized drift and historical volatility.
///
/// A series with fewer than two prices gives no returns and zero drift.
pub fn estimate(series: &PriceSeries) -> ReturnEstimate {
    let daily_returns = daily_returns(series);

    let annualized_drift = mean(&daily_returns).unwrap_or(0.0) * TRADING_DAYS_PER_YEAR;
    let historical_volatility =
        sample_std_dev(&daily_returns).map(|sd| sd * TRADING_DAYS_PER_YEAR.sqrt());

    ReturnEstimate {
        daily_returns,
        annualized_drift,
        historical_volatility,
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Standard deviation with an n - 1 denominator
fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}
