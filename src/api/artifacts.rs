// Artifact listing endpoint

use super::AppState;
use crate::artifacts::{ArtifactInfo, ArtifactStore};
use axum::{extract::State, Json};
use serde::Serialize;

/// Response for GET /api/artifacts
#[derive(Debug, Serialize)]
pub struct ArtifactsResponse {
    pub files: Vec<ArtifactInfo>,
}

/// GET /api/artifacts - existence and row counts for the expected artifacts
pub async fn get_artifacts(State(state): State<AppState>) -> Json<ArtifactsResponse> {
    let store = ArtifactStore::new(&state.config.artifacts_dir);
    Json(ArtifactsResponse {
        files: store.list(),
    })
}
