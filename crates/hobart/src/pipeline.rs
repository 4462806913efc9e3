//! End-to-end scoring pipeline.
//!
//! Raw financials flow through normalization, the ratio engine and the
//! scoring engine. Each stage returns a new frame; the input is never
//! modified.

use hobart_data::DataError;
use hobart_metrics::{MetricsConfig, MetricsError, compute_metrics_with, normalize_financials};
use hobart_output::ExportError;
use hobart_scoring::{ScoreWeights, ScoringError, score_companies};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from any pipeline stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Normalization or ratio computation failed
    #[error(transparent)]
    Metrics(#[from] MetricsError),

    /// Scoring failed
    #[error(transparent)]
    Scoring(#[from] ScoringError),

    /// Fetching or reading input failed
    #[error(transparent)]
    Data(#[from] DataError),

    /// Writing output failed
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Configuration of a scoring run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthPipeline {
    /// Column names used for market values
    pub metrics: MetricsConfig,
    /// Category weights, used as given
    pub weights: ScoreWeights,
}

impl HealthPipeline {
    /// Pipeline with the given weights and default metrics configuration.
    pub fn new(weights: ScoreWeights) -> Self {
        Self {
            metrics: MetricsConfig::default(),
            weights,
        }
    }

    /// Replace the metrics configuration.
    pub fn with_metrics_config(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = metrics;
        self
    }

    /// Normalize, compute ratios and score a raw batch.
    ///
    /// # Errors
    ///
    /// - [`MetricsError::EmptyBatch`] (wrapped) when `raw` has no rows
    /// - [`MetricsError::MissingColumn`] (wrapped) without a `ticker` column
    /// - [`ScoringError::InvalidWeight`] (wrapped) for bad weights
    pub fn run(&self, raw: &DataFrame) -> Result<DataFrame, PipelineError> {
        let normalized = normalize_financials(raw)?;
        tracing::debug!(rows = normalized.height(), "normalized");
        let metrics = compute_metrics_with(&normalized, &self.metrics)?;
        tracing::debug!(columns = metrics.width(), "computed metrics");
        let scored = score_companies(&metrics, &self.weights)?;
        tracing::info!(
            input_rows = raw.height(),
            companies = scored.height(),
            "scored batch"
        );
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_batch_stops_at_normalizer() {
        let raw = df! { "ticker" => Vec::<&str>::new() }.unwrap();
        let result = HealthPipeline::default().run(&raw);
        assert!(matches!(
            result,
            Err(PipelineError::Metrics(MetricsError::EmptyBatch))
        ));
    }

    #[test]
    fn test_invalid_weights_surface() {
        let raw = df! { "ticker" => ["A"], "revenue" => [1.0] }.unwrap();
        let pipeline = HealthPipeline::new(ScoreWeights::new(f64::NAN, 0.2, 0.2, 0.2));
        assert!(matches!(
            pipeline.run(&raw),
            Err(PipelineError::Scoring(ScoringError::InvalidWeight { .. }))
        ));
    }

    #[test]
    fn test_config_from_json() {
        let pipeline: HealthPipeline =
            serde_json::from_str(r#"{"weights": {"profitability": 1.0}}"#).unwrap();
        assert_eq!(pipeline.weights.profitability, 1.0);
        assert_eq!(pipeline.weights.cash_gen, 0.25);
        assert_eq!(pipeline.metrics, MetricsConfig::default());
    }
}
