// Analytics endpoint - runs the reporting queries

use super::{ApiError, AppState};
use crate::artifacts::ArtifactStore;
use axum::{extract::State, Json};
use serde::Serialize;

/// One exported report in the response
#[derive(Debug, Serialize)]
pub struct ExportInfo {
    pub file: String,
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response for POST /api/analytics/run
#[derive(Debug, Serialize)]
pub struct AnalyticsRunResponse {
    pub status: &'static str,
    pub exports: Vec<ExportInfo>,
}

/// POST /api/analytics/run - run both reporting queries
///
/// Precondition: the pipeline has produced funnel_steps.csv. Reports run
/// independently; one failing leaves the other's export intact, and the
/// request only fails outright when every report fails.
pub async fn run_analytics(
    State(state): State<AppState>,
) -> Result<Json<AnalyticsRunResponse>, ApiError> {
    let _guard = state.run_lock.lock().await;

    let steps_path = ArtifactStore::new(&state.config.artifacts_dir).path("funnel_steps.csv");
    if !steps_path.exists() {
        return Err(ApiError::not_found(
            "funnel_steps.csv not found. Run the pipeline first.",
        ));
    }

    let config = state.config.clone();
    let outcomes = tokio::task::spawn_blocking(move || crate::pipeline::run_all_reports(&config))
        .await
        .map_err(|e| ApiError::internal(format!("analytics task panicked: {e}")))?;

    let mut exports = Vec::with_capacity(outcomes.len());
    let mut failures = 0usize;
    for (kind, outcome) in &outcomes {
        match outcome {
            Ok(o) => exports.push(ExportInfo {
                file: kind.artifact().to_string(),
                rows: Some(o.rows),
                error: None,
            }),
            Err(e) => {
                failures += 1;
                exports.push(ExportInfo {
                    file: kind.artifact().to_string(),
                    rows: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    if failures == outcomes.len() {
        return Err(ApiError::internal("all reports failed"));
    }

    Ok(Json(AnalyticsRunResponse {
        status: "success",
        exports,
    }))
}
