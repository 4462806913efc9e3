//! Ticker to CIK resolution.

use crate::edgar::client::{EdgarClient, TickerEntry};
use crate::error::{DataError, Result};
use std::collections::HashMap;

/// Normalize a ticker to SEC form: trimmed, uppercase, `.` as class separator.
///
/// ```
/// assert_eq!(hobart_data::edgar::sec_symbol(" brk-b "), "BRK.B");
/// ```
pub fn sec_symbol(ticker: &str) -> String {
    ticker.replace('-', ".").trim().to_uppercase()
}

/// Lookup from ticker to zero-padded 10-digit CIK.
///
/// Built once (usually via [`TickerMap::fetch`]) and passed by reference to
/// whatever needs to resolve tickers.
#[derive(Debug, Clone, Default)]
pub struct TickerMap {
    ciks: HashMap<String, String>,
}

impl TickerMap {
    /// Download the SEC mapping.
    pub async fn fetch(client: &EdgarClient) -> Result<Self> {
        let entries = client.company_tickers().await?;
        let map = Self::from_entries(entries);
        tracing::debug!(tickers = map.len(), "loaded SEC ticker map");
        Ok(map)
    }

    /// Build a map from explicit entries. Blank tickers are skipped.
    pub fn from_entries(entries: impl IntoIterator<Item = TickerEntry>) -> Self {
        let ciks = entries
            .into_iter()
            .filter_map(|entry| {
                let ticker = entry.ticker.trim().to_uppercase();
                (!ticker.is_empty()).then(|| (ticker, format!("{:0>10}", entry.cik)))
            })
            .collect();
        Self { ciks }
    }

    /// Number of known tickers.
    pub fn len(&self) -> usize {
        self.ciks.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.ciks.is_empty()
    }

    /// Resolve a ticker to its padded CIK.
    ///
    /// Class shares may be written with `-` or `.`; `X.A` and `X.B` fall back
    /// to `X` when only the base symbol is registered.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::CikNotFound`] when neither form is known.
    pub fn resolve(&self, ticker: &str) -> Result<&str> {
        let symbol = sec_symbol(ticker);
        if let Some(cik) = self.ciks.get(&symbol) {
            return Ok(cik);
        }
        if let Some(base) = symbol
            .strip_suffix(".A")
            .or_else(|| symbol.strip_suffix(".B"))
        {
            let base = base.split('.').next().unwrap_or(base);
            if let Some(cik) = self.ciks.get(base) {
                return Ok(cik);
            }
        }
        Err(DataError::CikNotFound(ticker.to_string()))
    }
}
