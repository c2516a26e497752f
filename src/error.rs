//! Dashboard error taxonomy

use chrono::NaiveDate;
use thiserror::Error;

use crate::provider::ProviderError;
use crate::simulation::SimulationError;

/// Failures of one recomputation
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Ticker, lookback or volatility rejected before fetching anything
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The provider has no rows for this ticker and range
    #[error("no price data for {ticker} between {start} and {end}")]
    DataUnavailable {
        ticker: String,
        start: NaiveDate,
        end: NaiveDate,
    },
    #[error("price provider failed: {0}")]
    Provider(#[source] ProviderError),
    #[error("simulation failed: {0}")]
    Simulation(#[from] SimulationError),
}

impl DashboardError {
    /// Stable identifier used in render payloads
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardError::InvalidInput(_) => "invalid_input",
            DashboardError::DataUnavailable { .. } => "data_unavailable",
            DashboardError::Provider(_) => "provider",
            DashboardError::Simulation(_) => "simulation",
        }
    }
}
