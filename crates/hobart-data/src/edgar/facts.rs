//! XBRL company facts and the latest-annual extraction.
//!
//! The SEC serves every fact a company ever filed at
//! `https://data.sec.gov/api/xbrl/companyfacts/CIK##########.json`, keyed by
//! taxonomy (`us-gaap`, `dei`), concept and unit. Only annual filings are
//! used here; for each concept the value from the highest fiscal year wins.

use hobart_metrics::{CanonicalField, CompanyFinancials, PROVIDER_CONCEPTS};
use serde::Deserialize;
use std::collections::HashMap;

/// US GAAP taxonomy key
pub const US_GAAP: &str = "us-gaap";

/// Document and entity information taxonomy key
pub const DEI: &str = "dei";

/// Forms whose facts count as annual.
pub const ANNUAL_FORMS: [&str; 2] = ["10-K", "10-K/A"];

/// Point-in-time share counts, in order of preference on equal fiscal years.
const INSTANT_SHARE_CONCEPTS: [(&str, &str); 2] = [
    (US_GAAP, "CommonStockSharesOutstanding"),
    (DEI, "EntityCommonStockSharesOutstanding"),
];

/// Weighted-average share counts used when no instant count is filed.
const WEIGHTED_SHARE_CONCEPTS: [(&str, &str); 2] = [
    (US_GAAP, "WeightedAverageNumberOfSharesOutstandingBasic"),
    (US_GAAP, "WeightedAverageNumberOfDilutedSharesOutstanding"),
];

/// All facts filed by one company.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyFacts {
    /// Registrant name
    #[serde(default)]
    pub entity_name: String,
    /// taxonomy -> concept -> data
    #[serde(default)]
    pub facts: HashMap<String, HashMap<String, ConceptFacts>>,
}

/// Facts reported for one concept, grouped by unit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConceptFacts {
    /// unit (e.g. `USD`, `shares`) -> reported values
    #[serde(default)]
    pub units: HashMap<String, Vec<FactEntry>>,
}

/// One reported value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FactEntry {
    /// Reported value
    pub val: f64,
    /// Fiscal year of the filing
    #[serde(default)]
    pub fy: Option<i64>,
    /// Fiscal period (`FY`, `Q1`, ...)
    #[serde(default)]
    pub fp: Option<String>,
    /// Form type (`10-K`, `10-Q`, ...)
    #[serde(default)]
    pub form: Option<String>,
    /// Period end date
    #[serde(default)]
    pub end: Option<String>,
}

impl FactEntry {
    fn annual_year(&self) -> Option<i64> {
        let annual = self
            .form
            .as_deref()
            .is_some_and(|form| ANNUAL_FORMS.contains(&form));
        // fy of zero means the filer left it blank
        self.fy.filter(|fy| annual && *fy != 0)
    }
}

impl CompanyFacts {
    /// Parse the SEC JSON payload.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Latest annual `(fiscal year, value)` of a concept in one unit.
    ///
    /// When several annual facts share the highest fiscal year, the last one
    /// listed wins (amendments are listed after the original filing).
    pub fn latest_annual(&self, taxonomy: &str, concept: &str, unit: &str) -> Option<(i64, f64)> {
        self.facts
            .get(taxonomy)?
            .get(concept)?
            .units
            .get(unit)?
            .iter()
            .filter_map(|entry| entry.annual_year().map(|fy| (fy, entry.val)))
            .max_by_key(|(fy, _)| *fy)
    }

    /// Latest annual share count.
    ///
    /// Instant counts are preferred; weighted-average counts are only used
    /// when no instant count was filed.
    pub fn latest_shares(&self) -> Option<(i64, f64)> {
        self.best_of(&INSTANT_SHARE_CONCEPTS)
            .or_else(|| self.best_of(&WEIGHTED_SHARE_CONCEPTS))
    }

    fn best_of(&self, candidates: &[(&str, &str)]) -> Option<(i64, f64)> {
        candidates
            .iter()
            .filter_map(|(taxonomy, concept)| self.latest_annual(taxonomy, concept, "shares"))
            .fold(None, |best, got| match best {
                Some((fy, _)) if fy >= got.0 => best,
                _ => Some(got),
            })
    }

    /// Build the canonical record for one ticker.
    ///
    /// Each provider concept contributes its latest annual USD value, `fy` is
    /// the highest fiscal year seen among them and `ebitda` is `ebit + da`
    /// when both are filed. Price fields are left empty.
    pub fn to_financials(&self, ticker: &str) -> CompanyFinancials {
        let mut record = CompanyFinancials::new(ticker);
        let mut latest_fy = None;

        for (concept, field) in PROVIDER_CONCEPTS {
            if let Some((fy, value)) = self.latest_annual(US_GAAP, concept, "USD") {
                record.set_value(field, Some(value));
                latest_fy = latest_fy.max(Some(fy));
            }
        }

        if let (Some(ebit), Some(da)) = (
            record.value(CanonicalField::Ebit),
            record.value(CanonicalField::Da),
        ) {
            record.set_value(CanonicalField::Ebitda, Some(ebit + da));
        }

        if let Some((_, shares)) = self.latest_shares() {
            record.set_value(CanonicalField::SharesBasic, Some(shares));
        }

        record.fy = latest_fy.filter(|fy| *fy > 0);
        record
    }
}
