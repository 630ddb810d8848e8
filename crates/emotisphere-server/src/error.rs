//! HTTP-facing errors.
//!
//! [`ApiError`] converts into a JSON body `{ "error", "status" }` via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use emotisphere_adapters::ConfigError;

/// Errors returned by the control endpoints.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The pipeline cannot run because configuration is incomplete.
    #[error("pipeline unavailable: {0}")]
    Unavailable(#[from] ConfigError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
