//! Control endpoint handlers.
//!
//! All of them are thin: parse the request, call [`PipelineControl`],
//! and report the outcome as `{ ok, message }` JSON.
//!
//! [`PipelineControl`]: emotisphere_core::PipelineControl

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::{Query, State};
use emotisphere_adapters::ConfigError;
use emotisphere_core::config::DEFAULT_INTERVAL;
use emotisphere_core::{RunConfig, SchedulerStatus, StartOutcome, StopOutcome};
use emotisphere_types::RegionCode;
use emotisphere_types::region;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

/// Query string of `POST /start`.
#[derive(Debug, Default, Deserialize)]
pub struct StartParams {
    /// Comma-separated region codes. At most five are used.
    pub countries: Option<String>,
    /// `<n>s`, `<n>m`, `<n>h`, or bare seconds.
    pub interval: Option<String>,
}

/// Response body of `/start` and `/stop`.
#[derive(Debug, Serialize)]
pub struct ControlResponse {
    /// Whether the request was accepted.
    pub ok: bool,
    /// Human-readable outcome.
    pub message: String,
}

/// Response body of `GET /status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Scheduler state.
    #[serde(flatten)]
    pub scheduler: SchedulerStatus,
    /// Live subscriber connections.
    pub subscribers: usize,
}

/// `GET /health`
pub async fn health() -> &'static str {
    "OK"
}

/// `POST /start`
///
/// Refused with `503` while either API key is missing. Starting an
/// already running pipeline succeeds without changing anything.
pub async fn start(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StartParams>,
) -> Result<Json<ControlResponse>, ApiError> {
    if !state.missing_credentials.is_empty() {
        return Err(ConfigError::MissingCredentials(state.missing_credentials.clone()).into());
    }

    let regions = params
        .countries
        .as_deref()
        .map(RegionCode::parse_list)
        .filter(|r| !r.is_empty())
        .unwrap_or_else(RegionCode::defaults);
    let interval = params
        .interval
        .as_deref()
        .and_then(parse_interval)
        .unwrap_or(DEFAULT_INTERVAL);
    let config = RunConfig::new(interval, regions);

    let message = match state.control.start(config.clone()) {
        StartOutcome::Started => {
            info!("pipeline started via API");
            format!(
                "Pipeline started: every {}s for {}",
                config.interval().as_secs(),
                region::join(config.regions())
            )
        }
        StartOutcome::AlreadyRunning => "Pipeline already running".to_owned(),
    };

    Ok(Json(ControlResponse { ok: true, message }))
}

/// `POST /stop`
pub async fn stop(State(state): State<Arc<AppState>>) -> Json<ControlResponse> {
    let message = match state.control.stop() {
        StopOutcome::Stopped => {
            info!("pipeline stopped via API");
            "Pipeline stopped"
        }
        StopOutcome::NotRunning => "Pipeline not running",
    };
    Json(ControlResponse {
        ok: true,
        message: message.to_owned(),
    })
}

/// `GET /status`
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        scheduler: state.control.status(),
        subscribers: state.hub.subscriber_count().await,
    })
}

/// Parse `"90"`, `"45s"`, `"10m"`, or `"2h"`. Anything else is `None`.
pub fn parse_interval(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let (digits, unit_secs) = match raw.char_indices().last()? {
        (i, 's') => (raw.get(..i)?, 1),
        (i, 'm') => (raw.get(..i)?, 60),
        (i, 'h') => (raw.get(..i)?, 3600),
        _ => (raw, 1),
    };
    let value: u64 = digits.parse().ok()?;
    value.checked_mul(unit_secs).map(Duration::from_secs)
}
