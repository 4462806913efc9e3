//! Error types for scoring.

use thiserror::Error;

/// Result type for scoring operations.
pub type Result<T> = std::result::Result<T, ScoringError>;

/// Errors that can occur while scoring a batch.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// The metrics batch has no rows
    #[error("Cannot score an empty batch")]
    EmptyBatch,

    /// A scored metric column is absent
    #[error("Missing metric column: {0}")]
    MissingColumn(String),

    /// A weight is negative or not finite
    #[error("Invalid weight for {component}: {value} (must be finite and non-negative)")]
    InvalidWeight {
        /// Weight component name
        component: &'static str,
        /// Offending value
        value: f64,
    },

    /// All weights are zero, so they cannot be rescaled to sum to one
    #[error("At least one weight must be positive")]
    ZeroWeights,

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
