//! Pipeline error taxonomy
//!
//! Every fatal condition the core can hit maps onto one of these variants so
//! callers (CLI, HTTP layer) can react to the failure kind without string
//! matching. The core fails fast: no row skipping, no partial artifacts, no
//! retries.

use std::path::PathBuf;

/// Errors produced by the pipeline core and the reporting queries
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A required input file was absent before the stage started
    #[error("required file not found: {path}")]
    MissingInput { path: PathBuf },

    /// Input violated the fixed format: bad header, short row, or an
    /// unparseable timestamp. Fatal for the whole load.
    #[error("malformed input: {context}")]
    MalformedInput { context: String },

    /// A reporting query referenced a column or table missing from the
    /// persisted artifact (schema drift). Fatal for that report only.
    #[error("report '{report}' failed: {message}")]
    QueryExecution { report: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl PipelineError {
    pub fn missing_input(path: impl Into<PathBuf>) -> Self {
        Self::MissingInput { path: path.into() }
    }

    pub fn malformed(context: impl Into<String>) -> Self {
        Self::MalformedInput {
            context: context.into(),
        }
    }

    pub fn query(report: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QueryExecution {
            report: report.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
