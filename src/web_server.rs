//! GBM dashboard web server
//!
//! Usage:
//!   cargo run -- config/dashboard.yaml
//!
//! Without a config file (or with an invalid one) the built-in defaults are
//! used: http://127.0.0.1:8050, Yahoo Finance prices, AAPL / 1 year / 20%.

use gbm_dashboard::config::Config;
use gbm_dashboard::provider::YahooChartProvider;
use gbm_dashboard::{server, telemetry};
use std::env;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let (config, load_error) = match env::args().nth(1) {
        Some(path) => match Config::from_file(&path) {
            Ok(cfg) => (cfg, None),
            Err(e) => (Config::default(), Some(format!("{}: {}", path, e))),
        },
        None => (Config::default(), None),
    };

    telemetry::init_logging(&config.logging)?;

    if let Some(error) = load_error {
        tracing::warn!(%error, "Failed to load config, using defaults");
    }

    let provider = YahooChartProvider::new(&config.provider)?;

    println!("GBM dashboard starting...");
    println!("Open http://{}:{} in your browser", config.server.host, config.server.port);

    server::run(config, Arc::new(provider)).await?;
    Ok(())
}
