//! API server setup and initialization

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;

use crate::api::{self, AppState};
use crate::config::Config;

/// Start the HTTP API server. Runs until the process is stopped.
pub async fn serve(config: Config) -> Result<()> {
    let bind_addr = config.bind_addr;
    let state = AppState::new(config);

    // Build the router - pipeline/report triggers + artifact metadata
    let app = Router::new()
        .route("/api/pipeline/run", post(api::run_pipeline))
        .route("/api/analytics/run", post(api::run_analytics))
        .route("/api/artifacts", get(api::get_artifacts))
        .route("/api/pipeline/summary", get(api::get_summary))
        .with_state(state);

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;

    tracing::info!("API server listening on http://{}", bind_addr);
    axum::serve(listener, app).await.context("API server failed")?;
    Ok(())
}
