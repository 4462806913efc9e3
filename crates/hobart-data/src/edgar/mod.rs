//! SEC EDGAR access: ticker resolution and XBRL company facts.
//!
//! # Example
//!
//! ```no_run
//! use hobart_data::edgar::{EdgarClient, TickerMap};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = EdgarClient::new()?;
//!     let tickers = TickerMap::fetch(&client).await?;
//!     let facts = client.company_facts(tickers.resolve("AAPL")?).await?;
//!     let record = facts.to_financials("AAPL");
//!     println!("{} revenue: {:?}", facts.entity_name, record.revenue);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod facts;
pub mod tickers;

pub use client::{DEFAULT_USER_AGENT, EdgarClient, TickerEntry, USER_AGENT_ENV};
pub use facts::{ANNUAL_FORMS, CompanyFacts, ConceptFacts, FactEntry};
pub use tickers::{TickerMap, sec_symbol};
