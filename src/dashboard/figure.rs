//! Render payload
//!
//! Plotly-compatible figure JSON plus diagnostics. Failed recomputations
//! still produce a payload: no traces and an annotation carrying the message.

use chrono::NaiveDate;
use serde::Serialize;

use super::Dashboard;
use crate::error::DashboardError;

pub const ACTUAL_TRACE_NAME: &str = "Actual Prices";
pub const SIMULATED_TRACE_NAME: &str = "Simulated Prices";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadStatus {
    Ok,
    Error,
}

/// Everything the page needs to redraw after an input change
#[derive(Debug, Clone, Serialize)]
pub struct FigurePayload {
    pub status: PayloadStatus,
    pub figure: Figure,
    pub diagnostics: Option<Diagnostics>,
    pub warnings: Vec<String>,
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

/// One line series; non-finite prices serialize as null
#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    pub x: Vec<NaiveDate>,
    pub y: Vec<f64>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub mode: &'static str,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub title: Text,
    pub xaxis: Axis,
    pub yaxis: Axis,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Text {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Axis {
    pub title: Text,
}

/// Free text placed in the middle of the plot area
#[derive(Debug, Clone, Serialize)]
pub struct Annotation {
    pub text: String,
    pub xref: &'static str,
    pub yref: &'static str,
    pub x: f64,
    pub y: f64,
    pub showarrow: bool,
}

/// Numbers behind the chart, shown next to it
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub ticker: String,
    pub lookback_days: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Upper bound on `sessions`: Monday to Friday days in the range
    pub weekdays: u32,
    pub sessions: usize,
    pub annualized_drift: f64,
    /// Estimated from returns; the simulation uses `volatility` instead
    pub historical_volatility: Option<f64>,
    pub volatility: f64,
    pub seed: Option<u64>,
}

impl Layout {
    fn new(ticker: &str) -> Self {
        let title = if ticker.is_empty() {
            "GBM Simulation".to_string()
        } else {
            format!("GBM Simulation for {}", ticker)
        };
        Self {
            title: Text { text: title },
            xaxis: Axis {
                title: Text {
                    text: "Date".to_string(),
                },
            },
            yaxis: Axis {
                title: Text {
                    text: "Stock Price".to_string(),
                },
            },
            annotations: Vec::new(),
        }
    }
}

impl Trace {
    fn line(name: &str, x: Vec<NaiveDate>, y: Vec<f64>) -> Self {
        Self {
            x,
            y,
            kind: "scatter",
            mode: "lines",
            name: name.to_string(),
        }
    }
}

impl FigurePayload {
    /// Both series on the shared date axis
    pub fn success(dashboard: &Dashboard, seed: Option<u64>) -> Self {
        let dates: Vec<NaiveDate> = dashboard.actual.dates().collect();
        let actual = Trace::line(ACTUAL_TRACE_NAME, dates.clone(), dashboard.actual.prices().collect());
        let simulated = Trace::line(SIMULATED_TRACE_NAME, dates, dashboard.simulated.prices().to_vec());

        let mut warnings = Vec::new();
        if dashboard.actual.len() < 2 {
            warnings.push("Only one session in range; drift set to zero".to_string());
        }
        let non_finite = dashboard.simulated.non_finite_count();
        if non_finite > 0 {
            warnings.push(format!(
                "Simulated path contains {} non-finite prices; drift or volatility too extreme",
                non_finite
            ));
        }

        Self {
            status: PayloadStatus::Ok,
            figure: Figure {
                data: vec![actual, simulated],
                layout: Layout::new(&dashboard.inputs.ticker),
            },
            diagnostics: Some(Diagnostics {
                ticker: dashboard.inputs.ticker.clone(),
                lookback_days: dashboard.inputs.lookback.days(),
                start: dashboard.range.start,
                end: dashboard.range.end,
                weekdays: dashboard.range.weekdays(),
                sessions: dashboard.actual.len(),
                annualized_drift: dashboard.estimate.annualized_drift,
                historical_volatility: dashboard.estimate.historical_volatility,
                volatility: dashboard.inputs.volatility,
                seed,
            }),
            warnings,
            error: None,
        }
    }

    /// Empty chart annotated with the failure
    pub fn failure(ticker: &str, error: &DashboardError) -> Self {
        let message = error.to_string();
        let mut layout = Layout::new(ticker);
        layout.annotations.push(Annotation {
            text: message.clone(),
            xref: "paper",
            yref: "paper",
            x: 0.5,
            y: 0.5,
            showarrow: false,
        });

        Self {
            status: PayloadStatus::Error,
            figure: Figure {
                data: Vec::new(),
                layout,
            },
            diagnostics: None,
            warnings: Vec::new(),
            error: Some(ErrorInfo {
                kind: error.kind(),
                message,
            }),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == PayloadStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_payload_is_annotated_and_empty() {
        let err = DashboardError::InvalidInput("ticker must not be empty".to_string());
        let payload = FigurePayload::failure("", &err);

        assert!(!payload.is_ok());
        assert!(payload.figure.data.is_empty());
        assert_eq!(payload.figure.layout.title.text, "GBM Simulation");
        assert_eq!(payload.figure.layout.annotations.len(), 1);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"]["kind"], "invalid_input");
        assert!(json["figure"]["layout"]["annotations"][0]["text"]
            .as_str()
            .unwrap()
            .contains("ticker must not be empty"));
    }

    #[test]
    fn test_non_finite_prices_serialize_as_null() {
        let trace = Trace::line(
            SIMULATED_TRACE_NAME,
            vec![NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()],
            vec![f64::INFINITY],
        );
        let json = serde_json::to_value(&trace).unwrap();
        assert!(json["y"][0].is_null());
        assert_eq!(json["type"], "scatter");
        assert_eq!(json["x"][0], "2024-01-02");
    }
}
