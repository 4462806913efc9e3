//! Yahoo Finance price lookups.

pub mod quotes;

pub use quotes::{LOOKBACK_DAYS, LatestPrice, PriceProvider, YahooPriceProvider, yahoo_symbol};
