// Pipeline summary endpoint - metrics recomputed from persisted artifacts

use super::{ApiError, AppState};
use crate::events::PipelineSummary;
use axum::{extract::State, Json};
use serde::Serialize;

/// Response for GET /api/pipeline/summary
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub status: &'static str,
    pub metrics: PipelineSummary,
}

/// GET /api/pipeline/summary - summary metrics without running anything
///
/// Recomputes the rates from the persisted funnel_session.csv; 404 when no
/// pipeline has produced it yet.
pub async fn get_summary(State(state): State<AppState>) -> Result<Json<SummaryResponse>, ApiError> {
    let config = state.config.clone();
    let summary =
        tokio::task::spawn_blocking(move || crate::pipeline::summary_from_artifacts(&config))
            .await
            .map_err(|e| ApiError::internal(format!("summary task panicked: {e}")))??;

    Ok(Json(SummaryResponse {
        status: "success",
        metrics: summary,
    }))
}
