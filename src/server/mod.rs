//! HTTP server for the dashboard
//!
//! Serves the page, its embedded script and stylesheet, and a JSON endpoint
//! that recomputes the figure for the current control values. An optional
//! assets directory is served from disk under /assets.

use actix_web::error::{InternalError, QueryPayloadError};
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::sync::Arc;

use crate::calendar::LookbackWindow;
use crate::config::{Config, DashboardConfig};
use crate::dashboard::{self, FigurePayload, RawInputs, VOLATILITY_MAX, VOLATILITY_MIN, VOLATILITY_STEP};
use crate::error::DashboardError;
use crate::provider::DataProvider;

/// Shared, read-only state of the running server
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn DataProvider>,
    pub dashboard: DashboardConfig,
    /// Date the lookback window ends on
    pub today: fn() -> NaiveDate,
}

impl AppState {
    pub fn new(provider: Arc<dyn DataProvider>, dashboard: DashboardConfig) -> Self {
        Self {
            provider,
            dashboard,
            today: local_today,
        }
    }
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Debug, Serialize)]
struct LookbackOption {
    value: u32,
    label: &'static str,
}

#[derive(Debug, Serialize)]
struct SliderSpec {
    min: f64,
    max: f64,
    step: f64,
    default: f64,
    marks: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct ControlsResponse {
    default_ticker: String,
    default_lookback: u32,
    lookback_options: Vec<LookbackOption>,
    volatility: SliderSpec,
}

async fn index() -> HttpResponse {
    let html = include_str!("../../ui/index.html");
    HttpResponse::Ok().content_type("text/html").body(html)
}

async fn script() -> HttpResponse {
    let js = include_str!("../../ui/app.js");
    HttpResponse::Ok().content_type("text/javascript; charset=utf-8").body(js)
}

async fn stylesheet() -> HttpResponse {
    let css = include_str!("../../ui/style.css");
    HttpResponse::Ok().content_type("text/css; charset=utf-8").body(css)
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

async fn controls(state: web::Data<AppState>) -> HttpResponse {
    // Slider marks every 0.10 starting at the minimum
    let marks = (0..10)
        .map(|i| ((VOLATILITY_MIN + 0.1 * i as f64) * 100.0).round() / 100.0)
        .collect();

    HttpResponse::Ok().json(ControlsResponse {
        default_ticker: state.dashboard.default_ticker.clone(),
        default_lookback: state.dashboard.default_lookback.days(),
        lookback_options: LookbackWindow::ALL
            .iter()
            .map(|w| LookbackOption {
                value: w.days(),
                label: w.label(),
            })
            .collect(),
        volatility: SliderSpec {
            min: VOLATILITY_MIN,
            max: VOLATILITY_MAX,
            step: VOLATILITY_STEP,
            default: state.dashboard.default_volatility,
            marks,
        },
    })
}

async fn figure(state: web::Data<AppState>, query: web::Query<RawInputs>) -> HttpResponse {
    let today = (state.today)();
    let payload =
        dashboard::update_figure(state.provider.as_ref(), &query, &state.dashboard, today).await;
    HttpResponse::Ok().json(payload)
}

/// A query string that does not fit `RawInputs` (a repeated key, say) still
/// gets a figure payload rather than a plain-text 400
fn malformed_query(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let error = DashboardError::InvalidInput(format!("malformed query: {}", err));
    tracing::info!(%error, "Rejected dashboard query");
    let payload = FigurePayload::failure("", &error);
    InternalError::from_response(err, HttpResponse::Ok().json(payload)).into()
}

/// Register the dashboard routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/static/app.js", web::get().to(script))
        .route("/static/style.css", web::get().to(stylesheet))
        .route("/health", web::get().to(health))
        .route("/api/controls", web::get().to(controls))
        .service(
            web::resource("/api/figure")
                .app_data(web::QueryConfig::default().error_handler(malformed_query))
                .route(web::get().to(figure)),
        );
}

/// Run the server until shutdown
pub async fn run(config: Config, provider: Arc<dyn DataProvider>) -> std::io::Result<()> {
    let state = AppState::new(provider, config.dashboard.clone());
    let assets_dir = config.server.assets_dir.clone();
    let (host, port) = config.bind_address();

    match &assets_dir {
        Some(dir) => tracing::info!(%host, port, assets_dir = %dir.display(), "Starting GBM dashboard"),
        None => tracing::info!(%host, port, "Starting GBM dashboard"),
    }

    HttpServer::new(move || {
        let app = App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(configure);
        match &assets_dir {
            Some(dir) => app.service(actix_files::Files::new("/assets", dir)),
            None => app,
        }
    })
    .bind((host, port))?
    .run()
    .await
}
