//! YAML Configuration for the GBM dashboard
//!
//! Every section is optional; missing values fall back to the defaults the
//! dashboard ships with.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::calendar::LookbackWindow;
use crate::dashboard::{validate_ticker, validate_volatility};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Historical price source
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Initial control values
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Extra files served under /assets, e.g. a local Plotly build. A relative
    /// path is taken from the config file's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets_dir: Option<PathBuf>,
}

/// Chart API settings for the price provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Sent with every request; the chart API rejects clients without one
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Initial values of the dashboard controls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_ticker")]
    pub default_ticker: String,
    #[serde(default)]
    pub default_lookback: LookbackWindow,
    #[serde(default = "default_volatility")]
    pub default_volatility: f64,
    /// Fixed seed for every simulation; fresh randomness per request if unset
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// tracing filter directive, overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        config.validate()?;
        Ok(config)
    }

    /// Anchor relative paths at `base` instead of the working directory
    pub fn resolve_paths(&mut self, base: &Path) {
        if let Some(dir) = self.server.assets_dir.as_mut() {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("Server port must be non-zero".to_string()));
        }

        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "Provider timeout must be at least one second".to_string(),
            ));
        }

        if self.provider.base_url.trim().is_empty() {
            return Err(ConfigError::Validation("Provider base_url is empty".to_string()));
        }

        validate_ticker(&self.dashboard.default_ticker)
            .map_err(|e| ConfigError::Validation(format!("default_ticker: {}", e)))?;
        validate_volatility(self.dashboard.default_volatility)
            .map_err(|e| ConfigError::Validation(format!("default_volatility: {}", e)))?;

        Ok(())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            assets_dir: None,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_ticker: default_ticker(),
            default_lookback: LookbackWindow::default(),
            default_volatility: default_volatility(),
            seed: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8050
}

fn default_base_url() -> String {
    crate::provider::YahooChartProvider::DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    concat!("Mozilla/5.0 (compatible; gbm-dashboard/", env!("CARGO_PKG_VERSION"), ")").to_string()
}

fn default_ticker() -> String {
    "AAPL".to_string()
}

fn default_volatility() -> f64 {
    0.20
}

fn default_log_level() -> String {
    "info".to_string()
}
