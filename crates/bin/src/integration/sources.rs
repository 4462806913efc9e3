//! Input selection and live fetching.

use super::CliError;
use hobart_data::edgar::{EdgarClient, TickerMap};
use hobart_data::yahoo::YahooPriceProvider;
use hobart_data::{
    FetchOutcome, FinancialsFetcher, outcomes_to_frame, read_financials_csv, sample_financials,
    unique_tickers,
};
use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::*;
use std::path::PathBuf;
use std::time::Duration;

/// Where the raw batch comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InputSource {
    /// Bundled sample financials
    Sample,
    /// Uploaded CSV file
    Csv(PathBuf),
    /// Live SEC EDGAR and Yahoo Finance lookups
    Tickers(Vec<String>),
}

impl InputSource {
    /// Pick the source from the mutually exclusive flags. Sample is the default.
    pub(crate) fn from_flags(csv: Option<PathBuf>, tickers: Vec<String>) -> Self {
        match csv {
            Some(path) => Self::Csv(path),
            None if !tickers.is_empty() => Self::Tickers(tickers),
            None => Self::Sample,
        }
    }

    /// Short description for report headers.
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Sample => "bundled sample".to_string(),
            Self::Csv(path) => path.display().to_string(),
            Self::Tickers(tickers) => format!("{} ticker(s) from SEC EDGAR", tickers.len()),
        }
    }
}

/// Load the raw batch for a source.
pub(crate) async fn load_batch(
    source: &InputSource,
    concurrency: usize,
) -> Result<DataFrame, CliError> {
    match source {
        InputSource::Sample => Ok(sample_financials()?),
        InputSource::Csv(path) => Ok(read_financials_csv(path)?),
        InputSource::Tickers(tickers) => fetch_tickers(tickers, concurrency).await,
    }
}

async fn fetch_tickers(tickers: &[String], concurrency: usize) -> Result<DataFrame, CliError> {
    let unique = unique_tickers(tickers);
    if unique.is_empty() {
        return Ok(DataFrame::empty());
    }

    let client = EdgarClient::new()?;
    tracing::debug!(user_agent = client.user_agent(), "resolving tickers");
    let map = TickerMap::fetch(&client).await?;
    let prices = YahooPriceProvider::new()?;
    let fetcher = FinancialsFetcher::new(client, prices).with_concurrency(concurrency);

    let pb = ProgressBar::new(unique.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Fetching company facts...");

    let outcomes = fetcher
        .fetch_outcomes(&unique, &map, |outcome| {
            pb.set_message(outcome.ticker().to_string());
            pb.inc(1);
        })
        .await;

    let degraded: Vec<&FetchOutcome> = outcomes.iter().filter(|o| o.is_degraded()).collect();
    pb.finish_with_message(format!(
        "Fetched {} companies ({} degraded)",
        outcomes.len() - degraded.len(),
        degraded.len()
    ));
    for outcome in degraded {
        eprintln!(
            "  {}: {}",
            outcome.ticker(),
            outcome.error().unwrap_or("unknown error")
        );
    }

    Ok(outcomes_to_frame(&outcomes)?)
}
