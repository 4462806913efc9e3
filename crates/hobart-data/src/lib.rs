#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod edgar;
pub mod error;
pub mod fetch;
pub mod input;
pub mod yahoo;

pub use error::{DataError, Result};
pub use fetch::{
    DEFAULT_CONCURRENCY, FactsSource, FetchOutcome, FinancialsFetcher, PRICE_FALLBACK,
    outcomes_to_frame, unique_tickers,
};
pub use input::{
    SAMPLE_FINANCIALS_CSV, read_financials_csv, read_financials_csv_bytes, sample_financials,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
