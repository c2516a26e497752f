//! GBM dashboard
//!
//! Fetches historical daily prices for a ticker and overlays a Geometric
//! Brownian Motion path whose drift is estimated from the history and whose
//! volatility is chosen by the user.
//!
//! - `prices`: validated historical series
//! - `estimator`: daily returns, annualized drift and volatility
//! - `simulation`: GBM path with an injectable normal source
//! - `calendar`: lookback windows and date ranges
//! - `provider`: historical price sources
//! - `dashboard`: per-change recomputation and render payload
//! - `server`: HTTP routes

pub mod calendar;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod estimator;
pub mod prices;
pub mod provider;
pub mod server;
pub mod simulation;
pub mod telemetry;
