//! Peer z-scores.
//!
//! Statistics are taken over the whole batch, so scoring cannot stream rows:
//! every entity must be present before any z-score is produced.

use crate::error::{Result, ScoringError};
use polars::prelude::*;

/// Standard deviations at or below this are treated as zero variance.
pub const STD_EPSILON: f64 = 1e-12;

/// Batch mean and population standard deviation of one column.
///
/// Null and non-finite cells are excluded from both statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeerStats {
    /// Number of defined values
    pub count: usize,
    /// Mean of the defined values
    pub mean: Option<f64>,
    /// Population standard deviation (ddof = 0) of the defined values
    pub std: Option<f64>,
}

impl PeerStats {
    /// Compute statistics for a column of `frame`.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::MissingColumn`] if the column does not exist.
    pub fn of(frame: &DataFrame, column: &str) -> Result<Self> {
        let values = frame
            .column(column)
            .map_err(|_| ScoringError::MissingColumn(column.to_string()))?
            .cast(&DataType::Float64)?;
        let defined: Vec<f64> = values
            .f64()?
            .into_iter()
            .flatten()
            .filter(|v| v.is_finite())
            .collect();
        Ok(Self::from_values(&defined))
    }

    /// Compute statistics from already-defined values.
    pub fn from_values(values: &[f64]) -> Self {
        let count = values.len();
        if count == 0 {
            return Self {
                count,
                mean: None,
                std: None,
            };
        }
        let n = count as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            count,
            mean: Some(mean),
            std: Some(variance.sqrt()),
        }
    }

    /// Whether the column has (near) zero spread across the batch.
    pub fn is_degenerate(&self) -> bool {
        self.std.is_some_and(|std| std <= STD_EPSILON)
    }

    /// Expression standardizing `column` against these statistics.
    ///
    /// - no defined values: every row is null;
    /// - zero variance: every row is exactly `0.0`;
    /// - otherwise `(value - mean) / std`, with undefined cells staying null.
    pub fn zscore_expr(&self, column: &str) -> Expr {
        match (self.mean, self.std) {
            (Some(_), Some(std)) if std <= STD_EPSILON => lit(0.0),
            (Some(mean), Some(std)) => {
                let value = col(column).cast(DataType::Float64);
                when(value.clone().abs().lt(lit(f64::INFINITY)))
                    .then((value - lit(mean)) / lit(std))
                    .otherwise(lit(NULL))
            }
            _ => lit(NULL).cast(DataType::Float64),
        }
    }
}
