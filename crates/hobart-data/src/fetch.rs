//! Bulk fetching of canonical financials.
//!
//! Every requested ticker yields exactly one [`FetchOutcome`]. A ticker that
//! cannot be resolved or fetched becomes a degraded row carrying the failure
//! note; it never fails the batch.

use crate::edgar::{CompanyFacts, EdgarClient, TickerMap, sec_symbol};
use crate::error::Result;
use crate::yahoo::PriceProvider;
use futures::stream::{self, StreamExt};
use hobart_metrics::{CanonicalField, CompanyFinancials};
use polars::prelude::*;
use std::collections::HashSet;
use std::future::Future;

/// Number of tickers fetched concurrently.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Price used when no quote can be found, and share count / price used when
/// a whole batch lacks them.
pub const PRICE_FALLBACK: f64 = 1.0;

/// Source of XBRL company facts by CIK.
pub trait FactsSource {
    /// Fetch all facts for a zero-padded CIK.
    fn fetch_facts(&self, cik: &str) -> impl Future<Output = Result<CompanyFacts>>;
}

impl FactsSource for EdgarClient {
    async fn fetch_facts(&self, cik: &str) -> Result<CompanyFacts> {
        self.company_facts(cik).await
    }
}

/// Result of fetching one ticker.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Financials were retrieved
    Fetched(CompanyFinancials),
    /// The ticker could not be resolved or fetched
    Degraded {
        /// Uppercase ticker as requested
        ticker: String,
        /// Failure note
        reason: String,
    },
}

impl FetchOutcome {
    /// Ticker of the outcome.
    pub fn ticker(&self) -> &str {
        match self {
            Self::Fetched(record) => &record.ticker,
            Self::Degraded { ticker, .. } => ticker,
        }
    }

    /// Whether the fetch failed.
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// Failure note of a degraded outcome.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Fetched(_) => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }

    /// Canonical record for the batch frame.
    pub fn to_record(&self) -> CompanyFinancials {
        match self {
            Self::Fetched(record) => record.clone(),
            Self::Degraded { ticker, reason } => CompanyFinancials::degraded(ticker, reason),
        }
    }
}

/// Trim, drop blanks and de-duplicate tickers case-insensitively, keeping the
/// first spelling of each.
pub fn unique_tickers<I, S>(tickers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    tickers
        .into_iter()
        .filter_map(|ticker| {
            let ticker = ticker.as_ref().trim();
            (!ticker.is_empty() && seen.insert(ticker.to_uppercase())).then(|| ticker.to_string())
        })
        .collect()
}

/// Combine outcomes into one batch frame in canonical layout.
///
/// Degraded rows hold only `ticker` and `error`. When no row has a share
/// count or a price, the column is filled with [`PRICE_FALLBACK`] so market
/// values stay computable. No outcomes yield an empty frame.
pub fn outcomes_to_frame(outcomes: &[FetchOutcome]) -> Result<DataFrame> {
    if outcomes.is_empty() {
        return Ok(DataFrame::empty());
    }

    let records: Vec<CompanyFinancials> = outcomes.iter().map(FetchOutcome::to_record).collect();
    let frame = CompanyFinancials::to_frame(&records)?;

    let defaults: Vec<Expr> = [CanonicalField::SharesBasic, CanonicalField::Price]
        .iter()
        .filter(|field| {
            frame
                .column(field.name())
                .is_ok_and(|c| c.null_count() == frame.height())
        })
        .map(|field| lit(PRICE_FALLBACK).alias(field.name()))
        .collect();

    if defaults.is_empty() {
        return Ok(frame);
    }
    Ok(frame.lazy().with_columns(defaults).collect()?)
}

/// Fetches fundamentals and prices for a list of tickers.
#[derive(Debug)]
pub struct FinancialsFetcher<F, P> {
    facts: F,
    prices: P,
    concurrency: usize,
}

impl<F: FactsSource, P: PriceProvider> FinancialsFetcher<F, P> {
    /// Create a fetcher from a facts source and a price provider.
    pub const fn new(facts: F, prices: P) -> Self {
        Self {
            facts,
            prices,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Set how many tickers are in flight at once (at least one).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fetch one ticker. Never fails; errors become a degraded outcome.
    pub async fn fetch_one(&self, ticker: &str, tickers: &TickerMap) -> FetchOutcome {
        match self.try_fetch(ticker, tickers).await {
            Ok(record) => FetchOutcome::Fetched(record),
            Err(e) => {
                tracing::warn!(ticker, error = %e, "fetch failed; keeping degraded row");
                FetchOutcome::Degraded {
                    ticker: ticker.trim().to_uppercase(),
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn try_fetch(&self, ticker: &str, tickers: &TickerMap) -> Result<CompanyFinancials> {
        let cik = tickers.resolve(ticker)?;
        let facts = self.facts.fetch_facts(cik).await?;
        let mut record = facts.to_financials(&sec_symbol(ticker));

        match self.prices.latest_close(ticker).await {
            Ok(price) => {
                record.price = Some(price.close);
                record.price_asof = price.asof.map(|d| d.format("%Y-%m-%d").to_string());
            }
            Err(e) => {
                tracing::debug!(ticker, error = %e, "no quote; using fallback price");
                record.price = Some(PRICE_FALLBACK);
                record.price_asof = None;
            }
        }
        Ok(record)
    }

    /// Fetch every unique ticker, calling `on_done` as each one completes.
    ///
    /// Outcomes come back in input order (see [`unique_tickers`]).
    pub async fn fetch_outcomes<I, S>(
        &self,
        tickers: I,
        map: &TickerMap,
        mut on_done: impl FnMut(&FetchOutcome),
    ) -> Vec<FetchOutcome>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique = unique_tickers(tickers);
        let outcomes: Vec<FetchOutcome> = stream::iter(unique.iter())
            .map(|ticker| self.fetch_one(ticker, map))
            .buffered(self.concurrency)
            .inspect(|outcome| on_done(outcome))
            .collect()
            .await;

        let degraded = outcomes.iter().filter(|o| o.is_degraded()).count();
        tracing::info!(
            requested = unique.len(),
            degraded,
            "fetched financials"
        );
        outcomes
    }

    /// Fetch every unique ticker into one batch frame.
    pub async fn fetch_bulk<I, S>(&self, tickers: I, map: &TickerMap) -> Result<DataFrame>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let outcomes = self.fetch_outcomes(tickers, map, |_| {}).await;
        outcomes_to_frame(&outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataError;
    use crate::edgar::TickerEntry;
    use crate::yahoo::{LatestPrice, yahoo_symbol};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn facts_json(revenue: f64, shares: Option<f64>) -> CompanyFacts {
        let shares = shares.map_or(String::new(), |s| {
            format!(
                r#", "CommonStockSharesOutstanding": {{"units": {{"shares": [{{"val": {s}, "fy": 2023, "form": "10-K"}}]}}}}"#
            )
        });
        CompanyFacts::from_json(&format!(
            r#"{{"entityName": "x", "facts": {{"us-gaap": {{
                "Revenues": {{"units": {{"USD": [{{"val": {revenue}, "fy": 2023, "form": "10-K"}}]}}}}
                {shares}
            }}}}}}"#
        ))
        .unwrap()
    }

    struct FakeFacts(HashMap<String, CompanyFacts>);

    impl FactsSource for FakeFacts {
        async fn fetch_facts(&self, cik: &str) -> Result<CompanyFacts> {
            self.0
                .get(cik)
                .cloned()
                .ok_or_else(|| {
                    DataError::EdgarApi(format!("Failed to fetch company facts: HTTP 404 ({cik})"))
                })
        }
    }

    struct FakePrices;

    impl PriceProvider for FakePrices {
        async fn latest_close(&self, ticker: &str) -> Result<LatestPrice> {
            match yahoo_symbol(ticker).as_str() {
                "AAA" => Ok(LatestPrice {
                    close: 12.5,
                    asof: NaiveDate::from_ymd_opt(2024, 1, 5),
                }),
                "BRK-B" => Ok(LatestPrice {
                    close: 400.0,
                    asof: None,
                }),
                other => Err(DataError::MissingData {
                    symbol: other.to_string(),
                    reason: "no quotes".to_string(),
                }),
            }
        }
    }

    fn ticker_map() -> TickerMap {
        TickerMap::from_entries([(1, "AAA"), (2, "BRK.B"), (3, "NOQ"), (4, "GONE")].map(
            |(cik, ticker)| TickerEntry {
                cik,
                ticker: ticker.to_string(),
                title: String::new(),
            },
        ))
    }

    fn f64_values(frame: &DataFrame, column: &str) -> Vec<Option<f64>> {
        frame.column(column).unwrap().f64().unwrap().into_iter().collect()
    }

    fn text_values(frame: &DataFrame, column: &str) -> Vec<Option<String>> {
        frame
            .column(column)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect()
    }

    fn fetcher(with_shares: bool) -> FinancialsFetcher<FakeFacts, FakePrices> {
        let shares = |s: f64| with_shares.then_some(s);
        let facts = HashMap::from([
            ("0000000001".to_string(), facts_json(100.0, shares(10.0))),
            ("0000000002".to_string(), facts_json(300.0, shares(20.0))),
            ("0000000003".to_string(), facts_json(50.0, shares(5.0))),
        ]);
        FinancialsFetcher::new(FakeFacts(facts), FakePrices).with_concurrency(2)
    }

    #[test]
    fn test_unique_tickers() {
        let unique = unique_tickers(["aaa", " AAA ", "", "  ", "brk-b", "BRK-B", "zzz"]);
        assert_eq!(unique, vec!["aaa", "brk-b", "zzz"]);
    }

    #[tokio::test]
    async fn test_fetched_record() {
        let outcome = fetcher(true).fetch_one("aaa", &ticker_map()).await;
        let FetchOutcome::Fetched(record) = outcome else {
            panic!("expected fetched outcome");
        };
        assert_eq!(record.ticker, "AAA");
        assert_eq!(record.fy, Some(2023));
        assert_eq!(record.revenue, Some(100.0));
        assert_eq!(record.shares_basic, Some(10.0));
        assert_eq!(record.price, Some(12.5));
        assert_eq!(record.price_asof.as_deref(), Some("2024-01-05"));
    }

    #[tokio::test]
    async fn test_class_share_ticker_normalized() {
        let outcome = fetcher(true).fetch_one("brk-b", &ticker_map()).await;
        assert_eq!(outcome.ticker(), "BRK.B");
        assert!(!outcome.is_degraded());
    }

    #[tokio::test]
    async fn test_missing_quote_falls_back() {
        let FetchOutcome::Fetched(record) = fetcher(true).fetch_one("NOQ", &ticker_map()).await
        else {
            panic!("expected fetched outcome");
        };
        assert_eq!(record.price, Some(PRICE_FALLBACK));
        assert_eq!(record.price_asof, None);
    }

    #[tokio::test]
    async fn test_failures_degrade() {
        let map = ticker_map();
        let unknown = fetcher(true).fetch_one("nope", &map).await;
        assert_eq!(unknown.ticker(), "NOPE");
        let FetchOutcome::Degraded { reason, .. } = &unknown else {
            panic!("expected degraded outcome");
        };
        assert!(reason.contains("CIK not found"));

        let gone = fetcher(true).fetch_one("GONE", &map).await;
        assert!(gone.is_degraded());
        assert!(gone.error().is_some_and(|e| e.contains("HTTP 404")));
    }

    #[tokio::test]
    async fn test_bulk_frame_keeps_order_and_degraded_rows() {
        let mut seen = Vec::new();
        let outcomes = fetcher(true)
            .fetch_outcomes(["AAA", "nope", "brk-b", "aaa"], &ticker_map(), |o| {
                seen.push(o.ticker().to_string());
            })
            .await;
        assert_eq!(seen, vec!["AAA", "NOPE", "BRK.B"]);

        let frame = outcomes_to_frame(&outcomes).unwrap();
        assert_eq!(frame.height(), 3);
        let errors = text_values(&frame, "error");
        assert!(errors[0].is_none());
        assert!(errors[1].as_deref().is_some_and(|e| e.contains("CIK not found")));
        assert_eq!(text_values(&frame, "ticker")[2].as_deref(), Some("BRK.B"));
        let shares = f64_values(&frame, "shares_basic");
        assert_eq!(shares, vec![Some(10.0), None, Some(20.0)]);
    }

    #[tokio::test]
    async fn test_batch_without_shares_defaults_to_one() {
        let frame = fetcher(false)
            .fetch_bulk(["AAA", "NOQ"], &ticker_map())
            .await
            .unwrap();
        assert_eq!(f64_values(&frame, "shares_basic"), vec![Some(1.0), Some(1.0)]);
    }

    #[tokio::test]
    async fn test_all_degraded_batch() {
        let frame = fetcher(true)
            .fetch_bulk(["X1", "X2"], &ticker_map())
            .await
            .unwrap();
        assert_eq!(f64_values(&frame, "price"), vec![Some(1.0), Some(1.0)]);
        assert_eq!(frame.column("error").unwrap().null_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_request() {
        let frame = fetcher(true)
            .fetch_bulk(Vec::<String>::new(), &ticker_map())
            .await
            .unwrap();
        assert_eq!(frame.height(), 0);
    }
}
