//! Error types for normalization and ratio computation.

use thiserror::Error;

/// Result type for metrics operations.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Errors that can occur while preparing a financials batch.
///
/// Numeric edge cases (zero denominators, missing operands) are never errors;
/// they resolve to null cells.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// The input batch has no rows
    #[error("No financial data: the input batch is empty")]
    EmptyBatch,

    /// A required column is absent
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
