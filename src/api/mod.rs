// HTTP API module - exposes pipeline execution and artifact metadata
//
// This module provides the endpoints the dashboard UI and external
// integrations call:
// - Pipeline execution (ETL)
// - Analytics query execution
// - Artifact listing and summary metrics
//
// All endpoints return JSON and are designed for local consumption only.
// Security: binds to 127.0.0.1 by default (localhost only).

mod analytics;
mod artifacts;
mod pipeline;
mod summary;

// Re-export endpoint handlers
pub use analytics::run_analytics;
pub use artifacts::get_artifacts;
pub use pipeline::run_pipeline;
pub use summary::get_summary;

use crate::config::Config;
use crate::error::PipelineError;
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared state for API handlers
///
/// The run lock serializes pipeline and report executions: concurrent runs
/// against one artifact directory could observe partially-written output,
/// so the server - acting as the orchestrator - admits one at a time. The
/// core itself does no locking.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub run_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            run_lock: Arc::new(Mutex::new(())),
        }
    }
}

/// JSON error body, matching the shape the dashboard expects
#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    error_code: &'static str,
    message: String,
}

/// API error, carrying the HTTP status and a machine-readable code
/// Converted to a JSON response via IntoResponse
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "Internal",
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "MissingInput",
            message: message.into(),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let (status, code) = match &err {
            PipelineError::MissingInput { .. } => (StatusCode::NOT_FOUND, "MissingInput"),
            PipelineError::MalformedInput { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "MalformedInput")
            }
            PipelineError::QueryExecution { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "QueryExecutionError")
            }
            PipelineError::Io(_) | PipelineError::Csv(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "ExecutionError")
            }
        };
        Self {
            status,
            code,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("API error: {} - {}", self.status, self.message);

        let body = ErrorBody {
            status: "error",
            error_code: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_taxonomy_maps_to_status_codes() {
        let missing: ApiError = PipelineError::missing_input("/data/events.csv").into();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert_eq!(missing.code, "MissingInput");

        let malformed: ApiError = PipelineError::malformed("line 3: bad timestamp").into();
        assert_eq!(malformed.status, StatusCode::UNPROCESSABLE_ENTITY);

        let drift: ApiError = PipelineError::query("sku_dropoff", "no 'sku' column").into();
        assert_eq!(drift.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(drift.code, "QueryExecutionError");
    }

    #[test]
    fn test_error_body_shape() {
        let body = ErrorBody {
            status: "error",
            error_code: "MissingInput",
            message: "required file not found: events.csv".to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error_code"], "MissingInput");
        assert!(json["message"].as_str().unwrap().contains("events.csv"));
    }
}
