//! Artifact store: atomic CSV persistence and artifact metadata
//!
//! Every output is written as a whole file: rows go to a `.tmp` sibling
//! first and the finished file is renamed over the target, so a failed run
//! never leaves a half-updated artifact behind. Directory creation is an
//! explicit setup step, never an import-time side effect.

use crate::error::Result;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// The four artifacts a complete run produces
pub const EXPECTED_ARTIFACTS: [&str; 4] = [
    "funnel_session.csv",
    "funnel_steps.csv",
    "sku_dropoff.csv",
    "cohort_retention.csv",
];

/// Metadata for one artifact, as listed by the API
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactInfo {
    pub name: String,
    pub exists: bool,
    /// Data rows (header excluded); None when absent or unreadable
    pub rows: Option<usize>,
}

/// Owns the artifacts directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create the artifacts directory if needed
    pub fn ensure_exists(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Write one artifact atomically. Returns the number of data rows.
    pub fn write_csv<I>(&self, name: &str, header: &[&str], rows: I) -> Result<usize>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        self.ensure_exists()?;
        let target = self.path(name);
        let tmp = self.path(&format!("{name}.tmp"));

        let mut writer = csv::Writer::from_path(&tmp)?;
        writer.write_record(header)?;
        let mut count = 0usize;
        for row in rows {
            writer.write_record(&row)?;
            count += 1;
        }
        writer.flush()?;
        drop(writer);

        fs::rename(&tmp, &target)?;
        tracing::debug!(artifact = name, rows = count, "artifact written");
        Ok(count)
    }

    /// Count data rows (header excluded). None when the file is absent.
    pub fn count_rows(&self, name: &str) -> Result<Option<usize>> {
        let path = self.path(name);
        if !path.exists() {
            return Ok(None);
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&path)?;
        let mut count = 0usize;
        for record in reader.records() {
            record?;
            count += 1;
        }
        Ok(Some(count))
    }

    /// List the expected artifacts with existence and row counts.
    ///
    /// An unreadable artifact lists as existing with an unknown row count;
    /// listing never fails.
    pub fn list(&self) -> Vec<ArtifactInfo> {
        EXPECTED_ARTIFACTS
            .iter()
            .map(|name| ArtifactInfo {
                name: (*name).to_string(),
                exists: self.path(name).exists(),
                rows: self.count_rows(name).ok().flatten(),
            })
            .collect()
    }
}
