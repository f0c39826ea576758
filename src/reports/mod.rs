//! Reporting queries over the persisted funnel artifacts
//!
//! Reports re-read `funnel_steps.csv` from disk rather than consuming the
//! in-memory relation: the artifact is the interface, and schema drift
//! between pipeline and query versions surfaces as a QueryExecution error
//! for the affected report alone. Each report resolves only the columns it
//! actually references, so drift in one column never takes down a report
//! that ignores it.

mod cohort;
mod sku_dropoff;

use crate::artifacts::ArtifactStore;
use crate::config::Config;
use crate::error::{PipelineError, Result};
use std::path::Path;

/// The reports the crate knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    SkuDropoff,
    CohortRetention,
}

impl ReportKind {
    pub const ALL: [ReportKind; 2] = [ReportKind::SkuDropoff, ReportKind::CohortRetention];

    /// Artifact file this report writes
    pub fn artifact(&self) -> &'static str {
        match self {
            Self::SkuDropoff => "sku_dropoff.csv",
            Self::CohortRetention => "cohort_retention.csv",
        }
    }

    /// Stable name used by the CLI and error messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::SkuDropoff => "sku_dropoff",
            Self::CohortRetention => "cohort_retention",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sku_dropoff" | "sku-dropoff" => Some(Self::SkuDropoff),
            "cohort_retention" | "cohort-retention" => Some(Self::CohortRetention),
            _ => None,
        }
    }
}

/// Result of one report run
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    /// Data rows exported to the report's artifact
    pub rows: usize,
}

/// The persisted step table, loaded raw; columns resolve by header name on
/// demand so each report only depends on the columns it references
pub(crate) struct StepTable {
    headers: csv::StringRecord,
    records: Vec<csv::StringRecord>,
}

impl StepTable {
    fn load(kind: ReportKind, path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::query(
                kind.name(),
                format!("{} not found; run the pipeline first", path.display()),
            ));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| PipelineError::query(kind.name(), e.to_string()))?;
        let headers = reader
            .headers()
            .map_err(|e| PipelineError::query(kind.name(), e.to_string()))?
            .clone();

        let mut records = Vec::new();
        for record in reader.records() {
            records.push(record.map_err(|e| PipelineError::query(kind.name(), e.to_string()))?);
        }
        Ok(Self { headers, records })
    }

    /// Resolve a column index by name; missing columns are schema drift
    pub(crate) fn column(&self, kind: ReportKind, name: &str) -> Result<usize> {
        self.headers.iter().position(|h| h == name).ok_or_else(|| {
            PipelineError::query(
                kind.name(),
                format!("funnel_steps.csv has no '{name}' column"),
            )
        })
    }

    pub(crate) fn records(&self) -> &[csv::StringRecord] {
        &self.records
    }
}

/// Run one report end to end: read the step table, aggregate, write the
/// report's artifact.
pub fn run(config: &Config, kind: ReportKind) -> Result<ReportOutcome> {
    let store = ArtifactStore::new(&config.artifacts_dir);
    let table = StepTable::load(kind, &store.path("funnel_steps.csv"))?;

    let rows = match kind {
        ReportKind::SkuDropoff => sku_dropoff::run(&store, &table)?,
        ReportKind::CohortRetention => cohort::run(&store, &table)?,
    };

    tracing::info!(report = kind.name(), rows, "report exported");
    Ok(ReportOutcome { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn config_with_artifacts(dir: &Path) -> Config {
        Config {
            artifacts_dir: dir.to_path_buf(),
            ..Config::default()
        }
    }

    fn write_steps(dir: &Path, header: &[&str], rows: &[&[&str]]) {
        let store = ArtifactStore::new(dir);
        store
            .write_csv(
                "funnel_steps.csv",
                header,
                rows.iter()
                    .map(|row| row.iter().map(|s| s.to_string()).collect()),
            )
            .unwrap();
    }

    #[test]
    fn test_report_without_steps_is_query_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_artifacts(dir.path());
        let err = run(&config, ReportKind::SkuDropoff).unwrap_err();
        assert!(matches!(err, PipelineError::QueryExecution { .. }));
    }

    #[test]
    fn test_schema_drift_hits_only_the_referencing_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_artifacts(dir.path());
        // Steps without the 'sku' column: drop-off cannot run, but cohort
        // retention never references sku and stays unaffected
        write_steps(
            dir.path(),
            &["user_id", "session_id", "ts", "event_type", "step_order"],
            &[&["1", "1-0", "2024-01-15 10:00:00", "view", "1"]],
        );

        let err = run(&config, ReportKind::SkuDropoff).unwrap_err();
        match &err {
            PipelineError::QueryExecution { report, message } => {
                assert_eq!(report, "sku_dropoff");
                assert!(message.contains("'sku'"), "got: {message}");
            }
            other => panic!("expected QueryExecution, got {other:?}"),
        }

        let outcome = run(&config, ReportKind::CohortRetention).unwrap();
        assert_eq!(outcome.rows, 1);
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in ReportKind::ALL {
            assert_eq!(ReportKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ReportKind::from_name("sku-dropoff"), Some(ReportKind::SkuDropoff));
        assert_eq!(ReportKind::from_name("nope"), None);
    }
}
