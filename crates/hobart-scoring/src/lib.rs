#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod engine;
pub mod error;
pub mod registry;
pub mod weights;
pub mod zscore;

pub use engine::{
    DISPLAY_EPSILON, SCORE_0_100, SCORE_TOTAL, category_score_expr, score_companies,
};
pub use error::{Result, ScoringError};
pub use registry::{
    Direction, MetricCategory, MetricInfo, get_metric_info, metrics_by_category, scored_metrics,
    zscore_column,
};
pub use weights::ScoreWeights;
pub use zscore::{PeerStats, STD_EPSILON};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
