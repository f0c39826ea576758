// Pipeline endpoint - triggers a full ETL run

use super::{ApiError, AppState};
use crate::events::PipelineSummary;
use axum::{extract::State, Json};
use serde::Serialize;

/// Response for POST /api/pipeline/run
#[derive(Debug, Serialize)]
pub struct PipelineRunResponse {
    pub status: &'static str,
    pub metrics: PipelineSummary,
}

/// POST /api/pipeline/run - execute the ETL pipeline
///
/// Holds the run lock for the whole execution so only one run touches the
/// artifact directory at a time. The pipeline is blocking file work, so it
/// runs on a blocking worker thread.
pub async fn run_pipeline(
    State(state): State<AppState>,
) -> Result<Json<PipelineRunResponse>, ApiError> {
    let _guard = state.run_lock.lock().await;

    let config = state.config.clone();
    let summary = tokio::task::spawn_blocking(move || {
        let input = config.events_path();
        crate::pipeline::run_pipeline(&config, &input)
    })
    .await
    .map_err(|e| ApiError::internal(format!("pipeline task panicked: {e}")))??;

    Ok(Json(PipelineRunResponse {
        status: "success",
        metrics: summary,
    }))
}
