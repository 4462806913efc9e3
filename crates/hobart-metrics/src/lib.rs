#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod normalize;
pub mod ratios;
pub mod schema;

pub use error::{MetricsError, Result};
pub use normalize::{PROVIDER_CONCEPTS, normalize_financials};
pub use ratios::{DIVISION_EPSILON, MetricsConfig, compute_metrics, compute_metrics_with, safe_div};
pub use schema::{CanonicalField, CompanyFinancials, DerivedMetric, FISCAL_YEAR, TICKER};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
