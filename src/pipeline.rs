//! Pipeline runner: load -> sessionize -> steps -> aggregate -> persist
//!
//! Stages run strictly sequentially; each consumes the complete output of
//! its predecessor, and everything happens in-process with structured
//! return values. Any failure aborts the run before the affected artifact
//! is replaced.

use crate::artifacts::ArtifactStore;
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::events::{format_timestamp, FunnelSession, FunnelStep, PipelineSummary};
use crate::funnel::{aggregate_sessions, build_steps, FunnelTotals};
use crate::loader::load_events;
use crate::reports::{self, ReportKind, ReportOutcome};
use crate::sessionize::sessionize;
use std::path::Path;

/// Column headers of the persisted pipeline artifacts
pub const FUNNEL_STEPS_HEADER: [&str; 6] = [
    "user_id",
    "session_id",
    "ts",
    "event_type",
    "sku",
    "step_order",
];
pub const FUNNEL_SESSION_HEADER: [&str; 4] =
    ["session_id", "has_view", "has_cart", "has_purchase"];

/// Run the complete ETL pipeline over the event export at `input`.
pub fn run_pipeline(config: &Config, input: &Path) -> Result<PipelineSummary> {
    let store = ArtifactStore::new(&config.artifacts_dir);

    tracing::info!(input = %input.display(), "loading events");
    let events = load_events(input)?;
    let events_count = events.len();

    tracing::info!(gap_minutes = config.session_gap_minutes, "sessionizing");
    let sessionized = sessionize(events, config.session_gap());

    tracing::info!("building funnel steps");
    let steps = build_steps(sessionized);

    tracing::info!("aggregating session flags");
    let sessions = aggregate_sessions(&steps);

    let steps_count = store.write_csv("funnel_steps.csv", &FUNNEL_STEPS_HEADER, step_rows(&steps))?;
    let session_count = store.write_csv(
        "funnel_session.csv",
        &FUNNEL_SESSION_HEADER,
        session_rows(&sessions),
    )?;

    let totals = FunnelTotals::from_sessions(&sessions);
    let summary = PipelineSummary {
        events_count,
        steps_count,
        session_count,
        view_to_cart_rate: totals.view_to_cart_rate(),
        cart_to_purchase_rate: totals.cart_to_purchase_rate(),
    };

    tracing::info!(
        events = events_count,
        steps = steps_count,
        sessions = session_count,
        "pipeline complete"
    );
    if let Some(rate) = summary.view_to_cart_rate {
        tracing::info!(
            carts = totals.carts,
            views = totals.views,
            "view-to-cart rate: {:.2}%",
            rate
        );
    }
    if let Some(rate) = summary.cart_to_purchase_rate {
        tracing::info!(
            purchases = totals.purchases,
            carts = totals.carts,
            "cart-to-purchase rate: {:.2}%",
            rate
        );
    }

    Ok(summary)
}

/// Execute one reporting query against the persisted artifacts
pub fn run_report(config: &Config, kind: ReportKind) -> Result<ReportOutcome> {
    reports::run(config, kind)
}

/// Run every report, each independently: a failure in one never aborts the
/// other, and both outcomes come back to the caller
pub fn run_all_reports(config: &Config) -> Vec<(ReportKind, Result<ReportOutcome>)> {
    ReportKind::ALL
        .iter()
        .map(|&kind| (kind, reports::run(config, kind)))
        .collect()
}

/// Rebuild summary metrics from persisted artifacts.
///
/// The read-only path behind the summary endpoint: no pipeline execution,
/// just the session flag totals plus the step row count (one step per input
/// event, so the step table doubles as the event count).
pub fn summary_from_artifacts(config: &Config) -> Result<PipelineSummary> {
    let store = ArtifactStore::new(&config.artifacts_dir);
    let path = store.path("funnel_session.csv");
    if !path.exists() {
        return Err(PipelineError::missing_input(path));
    }

    let mut reader = csv::Reader::from_path(&path)?;
    let headers = reader.headers()?.clone();
    let col = |name: &str| headers.iter().position(|h| h == name);
    let (Some(view_col), Some(cart_col), Some(purchase_col)) =
        (col("has_view"), col("has_cart"), col("has_purchase"))
    else {
        return Err(PipelineError::malformed(
            "funnel_session.csv is missing its flag columns",
        ));
    };

    let mut totals = FunnelTotals::default();
    let mut session_count = 0usize;
    for record in reader.records() {
        let record = record?;
        session_count += 1;
        if record.get(view_col) == Some("1") {
            totals.views += 1;
        }
        if record.get(cart_col) == Some("1") {
            totals.carts += 1;
        }
        if record.get(purchase_col) == Some("1") {
            totals.purchases += 1;
        }
    }

    let steps_count = store.count_rows("funnel_steps.csv")?.unwrap_or(0);
    Ok(PipelineSummary {
        events_count: steps_count,
        steps_count,
        session_count,
        view_to_cart_rate: totals.view_to_cart_rate(),
        cart_to_purchase_rate: totals.cart_to_purchase_rate(),
    })
}

fn step_rows(steps: &[FunnelStep]) -> impl Iterator<Item = Vec<String>> + '_ {
    steps.iter().map(|s| {
        vec![
            s.user_id.clone(),
            s.session_id.clone(),
            format_timestamp(s.ts),
            s.kind.as_str().to_string(),
            s.sku.clone(),
            s.step_order.to_string(),
        ]
    })
}

fn session_rows(sessions: &[FunnelSession]) -> impl Iterator<Item = Vec<String>> + '_ {
    let flag = |b: bool| if b { "1" } else { "0" }.to_string();
    sessions.iter().map(move |s| {
        vec![
            s.session_id.clone(),
            flag(s.has_view),
            flag(s.has_cart),
            flag(s.has_purchase),
        ]
    })
}
