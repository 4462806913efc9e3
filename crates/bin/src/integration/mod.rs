//! Glue between the command line and the library crates.
//!
//! Input selection and fetching, weight resolution, and report output.

pub(crate) mod reports;
pub(crate) mod sources;
pub(crate) mod weights;

use hobart::PipelineError;
use hobart_data::DataError;
use hobart_output::ExportError;
use std::path::PathBuf;

/// Error type for CLI operations.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    /// Scoring pipeline error.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Fetch or input error.
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Report writing error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Weights file could not be read or parsed.
    #[error("Invalid weights file {path}: {reason}")]
    WeightsFile {
        /// File given with `--weights`
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Every category weight is zero.
    #[error("All category weights are zero; give at least one category a positive weight")]
    ZeroWeights,

    /// Progress bar template error.
    #[error("Progress bar error: {0}")]
    Progress(#[from] indicatif::style::TemplateError),

    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON rendering error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
