//! Latest closing prices from Yahoo Finance.

use crate::error::{DataError, Result};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use std::future::Future;
use yahoo_finance_api as yahoo;

/// Calendar days of history requested when looking for the latest close.
/// Wide enough to cover five trading days across a long weekend.
pub const LOOKBACK_DAYS: i64 = 7;

/// Most recent closing price of a symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestPrice {
    /// Closing price
    pub close: f64,
    /// Trading day of the close
    pub asof: Option<NaiveDate>,
}

/// Source of latest closing prices.
pub trait PriceProvider {
    /// Latest close for `ticker` (SEC or Yahoo spelling).
    fn latest_close(&self, ticker: &str) -> impl Future<Output = Result<LatestPrice>>;
}

/// Normalize a ticker to Yahoo form, where class shares use `-` (`BRK-B`).
///
/// ```
/// assert_eq!(hobart_data::yahoo::yahoo_symbol("brk.b"), "BRK-B");
/// ```
pub fn yahoo_symbol(ticker: &str) -> String {
    ticker.replace('.', "-").trim().to_uppercase()
}

/// Yahoo Finance price provider.
pub struct YahooPriceProvider {
    provider: yahoo::YahooConnector,
    lookback: ChronoDuration,
}

impl std::fmt::Debug for YahooPriceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooPriceProvider")
            .field("lookback", &self.lookback)
            .finish_non_exhaustive()
    }
}

impl YahooPriceProvider {
    /// Create a provider with the default lookback window.
    pub fn new() -> Result<Self> {
        Ok(Self {
            provider: yahoo::YahooConnector::new()?,
            lookback: ChronoDuration::days(LOOKBACK_DAYS),
        })
    }

    /// Change the history window searched for the latest close.
    pub fn with_lookback(mut self, lookback: ChronoDuration) -> Self {
        self.lookback = lookback;
        self
    }
}

impl PriceProvider for YahooPriceProvider {
    async fn latest_close(&self, ticker: &str) -> Result<LatestPrice> {
        let symbol = yahoo_symbol(ticker);
        if symbol.is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }

        let end = Utc::now();
        let start = end - self.lookback;
        let start_time = time::OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| DataError::TimeConversion(e.to_string()))?;
        let end_time = time::OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| DataError::TimeConversion(e.to_string()))?;

        let response = self
            .provider
            .get_quote_history(&symbol, start_time, end_time)
            .await?;
        let quotes = response.quotes()?;

        let last = quotes
            .iter()
            .rev()
            .find(|q| q.close.is_finite())
            .ok_or_else(|| DataError::MissingData {
                symbol: symbol.clone(),
                reason: "No closing price in lookback window".to_string(),
            })?;

        let asof = i64::try_from(last.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|ts| ts.date_naive());

        Ok(LatestPrice {
            close: last.close,
            asof,
        })
    }
}
