//! SEC EDGAR API client with rate limiting.

use crate::edgar::facts::CompanyFacts;
use crate::error::{DataError, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

/// SEC EDGAR API base URL
const EDGAR_BASE_URL: &str = "https://data.sec.gov/api";

/// Ticker to CIK mapping, hosted at www.sec.gov rather than data.sec.gov
const COMPANY_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";

/// Default rate limit: 10 requests per second (SEC requirement)
const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(100);

/// Environment variable overriding the user agent
pub const USER_AGENT_ENV: &str = "SEC_USER_AGENT";

/// User agent for SEC EDGAR requests (SEC requires identifying information)
pub const DEFAULT_USER_AGENT: &str = "hobart-health-scoring (email@example.com)";

/// One row of the SEC ticker mapping.
///
/// The SEC returns `{"0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."}, ...}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TickerEntry {
    /// CIK as a number (SEC returns this as an integer despite the name)
    #[serde(rename = "cik_str")]
    pub cik: u64,
    /// Ticker symbol
    pub ticker: String,
    /// Company name
    #[serde(default)]
    pub title: String,
}

/// Rate limiter to ensure we don't exceed SEC's rate limits
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Instant::now() - min_interval,
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// SEC EDGAR API client with rate limiting
///
/// Cloning is cheap and clones share one rate limiter, so concurrent fetches
/// stay within the SEC fair-access limit.
#[derive(Clone)]
pub struct EdgarClient {
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    base_url: String,
    user_agent: String,
}

impl EdgarClient {
    /// Create a client with the default rate limit (10 req/sec).
    ///
    /// The user agent is read from `SEC_USER_AGENT`, falling back to
    /// [`DEFAULT_USER_AGENT`].
    pub fn new() -> Result<Self> {
        let user_agent =
            std::env::var(USER_AGENT_ENV).unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());
        Self::with_config(&user_agent, DEFAULT_RATE_LIMIT)
    }

    /// Create a client with an explicit user agent and rate limit.
    ///
    /// # Example
    /// ```no_run
    /// use hobart_data::edgar::EdgarClient;
    /// use std::time::Duration;
    ///
    /// # fn example() -> hobart_data::Result<()> {
    /// // 5 requests per second
    /// let client = EdgarClient::with_config("Acme Research ops@acme.test", Duration::from_millis(200))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_config(user_agent: &str, min_interval: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(DataError::Network)?;

        Ok(Self {
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(min_interval))),
            base_url: EDGAR_BASE_URL.to_string(),
            user_agent: user_agent.to_string(),
        })
    }

    /// User agent sent with every request.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Download the full SEC ticker mapping.
    pub async fn company_tickers(&self) -> Result<Vec<TickerEntry>> {
        let data: HashMap<String, TickerEntry> =
            self.get_json(COMPANY_TICKERS_URL, "company tickers").await?;
        Ok(data.into_values().collect())
    }

    /// Fetch all XBRL company facts for a CIK.
    ///
    /// # Arguments
    /// * `cik` - CIK number, padded or unpadded
    pub async fn company_facts(&self, cik: &str) -> Result<CompanyFacts> {
        if cik.is_empty() {
            return Err(DataError::InvalidSymbol("Empty CIK".to_string()));
        }
        let cik_padded = format!("{cik:0>10}");
        let url = format!("{}/xbrl/companyfacts/CIK{}.json", self.base_url, cik_padded);
        self.get_json(&url, "company facts").await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        self.rate_limiter.lock().await.wait().await;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(DataError::Network)?;

        if !response.status().is_success() {
            return Err(DataError::EdgarApi(format!(
                "Failed to fetch {what}: HTTP {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| DataError::EdgarApi(format!("Failed to parse {what}: {e}")))
    }
}

impl std::fmt::Debug for EdgarClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgarClient")
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}
