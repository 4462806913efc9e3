//! Weight resolution: command-line flags over a JSON file over defaults.

use super::CliError;
use hobart::PipelineError;
use hobart_scoring::{ScoreWeights, ScoringError};
use std::path::Path;

/// Per-category weights given on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct WeightOverrides {
    pub(crate) profitability: Option<f64>,
    pub(crate) liquidity: Option<f64>,
    pub(crate) leverage: Option<f64>,
    pub(crate) cash_gen: Option<f64>,
}

impl WeightOverrides {
    fn apply(self, base: ScoreWeights) -> ScoreWeights {
        ScoreWeights {
            profitability: self.profitability.unwrap_or(base.profitability),
            liquidity: self.liquidity.unwrap_or(base.liquidity),
            leverage: self.leverage.unwrap_or(base.leverage),
            cash_gen: self.cash_gen.unwrap_or(base.cash_gen),
        }
    }
}

/// Parse a weights file. Missing keys keep their defaults.
pub(crate) fn read_weights_file(path: &Path) -> Result<ScoreWeights, CliError> {
    let invalid = |reason: String| CliError::WeightsFile {
        path: path.to_path_buf(),
        reason,
    };
    let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))
}

/// Combine the sources and rescale the result to sum to one.
pub(crate) fn resolve_weights(
    file: Option<&Path>,
    overrides: WeightOverrides,
) -> Result<ScoreWeights, CliError> {
    let base = match file {
        Some(path) => read_weights_file(path)?,
        None => ScoreWeights::default(),
    };
    overrides.apply(base).normalized().map_err(|e| match e {
        ScoringError::ZeroWeights => CliError::ZeroWeights,
        other => PipelineError::Scoring(other).into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    #[test]
    fn test_defaults_pass_through() {
        let weights = resolve_weights(None, WeightOverrides::default()).unwrap();
        assert_relative_eq!(weights.profitability, 0.35, epsilon = 1e-12);
        assert_relative_eq!(weights.cash_gen, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_flags_are_renormalized() {
        let overrides = WeightOverrides {
            profitability: Some(1.0),
            liquidity: Some(1.0),
            leverage: Some(1.0),
            cash_gen: Some(1.0),
        };
        let weights = resolve_weights(None, overrides).unwrap();
        assert_relative_eq!(weights.leverage, 0.25);
        assert_relative_eq!(weights.total(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_flags_override_file() {
        let path = std::env::temp_dir().join(format!("hobart-weights-{}.json", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{"profitability": 0.0, "liquidity": 0.0, "leverage": 0.0, "cash_gen": 3.0}}"#)
            .unwrap();

        let overrides = WeightOverrides {
            leverage: Some(1.0),
            ..WeightOverrides::default()
        };
        let weights = resolve_weights(Some(&path), overrides).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_relative_eq!(weights.cash_gen, 0.75);
        assert_relative_eq!(weights.leverage, 0.25);
        assert_relative_eq!(weights.profitability, 0.0);
    }

    #[test]
    fn test_all_zero_is_rejected() {
        let overrides = WeightOverrides {
            profitability: Some(0.0),
            liquidity: Some(0.0),
            leverage: Some(0.0),
            cash_gen: Some(0.0),
        };
        assert!(matches!(
            resolve_weights(None, overrides),
            Err(CliError::ZeroWeights)
        ));
    }

    #[test]
    fn test_negative_weight_is_rejected() {
        let overrides = WeightOverrides {
            liquidity: Some(-1.0),
            ..WeightOverrides::default()
        };
        assert!(matches!(
            resolve_weights(None, overrides),
            Err(CliError::Pipeline(PipelineError::Scoring(
                ScoringError::InvalidWeight { .. }
            )))
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = read_weights_file(Path::new("/nonexistent/hobart-weights.json"));
        assert!(matches!(result, Err(CliError::WeightsFile { .. })));
    }
}
