//! GBM Path Simulation
//!
//! Discrete Geometric Brownian Motion anchored on the first historical price.
//! Randomness comes from an injected [`NormalSource`] so paths can be
//! reproduced in tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::estimator::TRADING_DAYS_PER_YEAR;

/// Source of independent standard-normal draws
pub trait NormalSource {
    fn next_normal(&mut self) -> f64;
}

/// Standard-normal draws backed by a random number generator
#[derive(Debug, Clone)]
pub struct GaussianNoise<R> {
    rng: R,
}

impl<R: Rng> GaussianNoise<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl GaussianNoise<StdRng> {
    /// Fresh, independently seeded stream
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Reproducible stream
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> NormalSource for GaussianNoise<R> {
    fn next_normal(&mut self) -> f64 {
        self.rng.sample(rand_distr::StandardNormal)
    }
}

/// Replays a fixed list of draws, cycling when exhausted.
///
/// An empty list yields zeros.
#[derive(Debug, Clone)]
pub struct ScriptedNormals {
    draws: Vec<f64>,
    cursor: usize,
}

impl ScriptedNormals {
    pub fn new(draws: Vec<f64>) -> Self {
        Self { draws, cursor: 0 }
    }
}

impl NormalSource for ScriptedNormals {
    fn next_normal(&mut self) -> f64 {
        if self.draws.is_empty() {
            return 0.0;
        }
        let z = self.draws[self.cursor % self.draws.len()];
        self.cursor += 1;
        z
    }
}

/// Drift and volatility driving a simulated path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParameters {
    /// Annual drift (μ)
    pub annualized_drift: f64,
    /// Annual volatility (σ), the user's override
    pub volatility: f64,
    pub trading_days_per_year: f64,
}

impl SimulationParameters {
    pub fn new(annualized_drift: f64, volatility: f64) -> Self {
        Self {
            annualized_drift,
            volatility,
            trading_days_per_year: TRADING_DAYS_PER_YEAR,
        }
    }

    /// Length of one step in years
    pub fn dt(&self) -> f64 {
        1.0 / self.trading_days_per_year
    }
}

/// Rejected simulator inputs
#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error("anchor price must be positive and finite, got {0}")]
    InvalidAnchor(f64),
    #[error("a simulated path needs at least one step")]
    NoSteps,
    #[error("volatility must be non-negative and finite, got {0}")]
    InvalidVolatility(f64),
}

/// Simulated prices, one per historical observation
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedPath {
    prices: Vec<f64>,
}

impl SimulatedPath {
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Number of NaN or infinite prices
    pub fn non_finite_count(&self) -> usize {
        self.prices.iter().filter(|p| !p.is_finite()).count()
    }
}

/// Generate a GBM path of `steps` prices starting at `anchor`.
///
/// Each step: S(t+dt) = S(t) * exp(μ dt + σ √dt Z). Any drift is accepted;
/// non-finite prices from extreme parameters are kept in the path.
pub fn simulate_path<N: NormalSource + ?Sized>(
    anchor: f64,
    steps: usize,
    params: &SimulationParameters,
    normals: &mut N,
) -> Result<SimulatedPath, SimulationError> {
    if !anchor.is_finite() || anchor <= 0.0 {
        return Err(SimulationError::InvalidAnchor(anchor));
    }
    if steps == 0 {
        return Err(SimulationError::NoSteps);
    }
    if !params.volatility.is_finite() || params.volatility < 0.0 {
        return Err(SimulationError::InvalidVolatility(params.volatility));
    }

    let dt = params.dt();
    let drift_term = params.annualized_drift * dt;
    let diffusion_scale = params.volatility * dt.sqrt();

    let mut prices = Vec::with_capacity(steps);
    let mut current_price = anchor;
    prices.push(current_price);

    for _ in 1..steps {
        let z = normals.next_normal();
        current_price *= (drift_term + diffusion_scale * z).exp();
        prices.push(current_price);
    }

    Ok(SimulatedPath { prices })
}
