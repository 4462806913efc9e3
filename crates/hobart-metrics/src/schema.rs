//! Canonical financials schema.
//!
//! Every stage after normalization addresses columns through this schema, so a
//! normalized frame always carries each [`CanonicalField`] as a column (null
//! where the provider supplied nothing). [`CompanyFinancials`] is the typed
//! record form of one canonical row, used by data providers to build a batch.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Entity identifier column.
pub const TICKER: &str = "ticker";

/// Fiscal-period column, used only to keep the latest period per ticker.
pub const FISCAL_YEAR: &str = "fy";

/// Raw input fields of the canonical schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    /// Total revenue
    Revenue,
    /// Operating income
    Ebit,
    /// Depreciation and amortization
    Da,
    /// Operating income before depreciation and amortization
    Ebitda,
    /// Net income
    NetIncome,
    /// Total assets
    TotalAssets,
    /// Total liabilities
    TotalLiabilities,
    /// Current assets
    CurrentAssets,
    /// Current liabilities
    CurrentLiabilities,
    /// Inventory
    Inventory,
    /// Cash and cash equivalents
    Cash,
    /// Operating cash flow
    OperatingCf,
    /// Capital expenditure (sign varies by provider)
    Capex,
    /// Current portion of debt
    ShortTermDebt,
    /// Non-current debt
    LongTermDebt,
    /// Shareholders' equity
    ShareholdersEquity,
    /// Basic share count
    SharesBasic,
    /// Market price per share
    Price,
    /// Date the price was observed
    PriceAsof,
    /// Provider failure note for degraded rows
    Error,
}

impl CanonicalField {
    /// Every canonical field in column order.
    pub const ALL: [Self; 20] = [
        Self::Revenue,
        Self::Ebit,
        Self::Da,
        Self::Ebitda,
        Self::NetIncome,
        Self::TotalAssets,
        Self::TotalLiabilities,
        Self::CurrentAssets,
        Self::CurrentLiabilities,
        Self::Inventory,
        Self::Cash,
        Self::OperatingCf,
        Self::Capex,
        Self::ShortTermDebt,
        Self::LongTermDebt,
        Self::ShareholdersEquity,
        Self::SharesBasic,
        Self::Price,
        Self::PriceAsof,
        Self::Error,
    ];

    /// Column name of this field.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::Ebit => "ebit",
            Self::Da => "da",
            Self::Ebitda => "ebitda",
            Self::NetIncome => "net_income",
            Self::TotalAssets => "total_assets",
            Self::TotalLiabilities => "total_liabilities",
            Self::CurrentAssets => "current_assets",
            Self::CurrentLiabilities => "current_liabilities",
            Self::Inventory => "inventory",
            Self::Cash => "cash",
            Self::OperatingCf => "operating_cf",
            Self::Capex => "capex",
            Self::ShortTermDebt => "short_term_debt",
            Self::LongTermDebt => "long_term_debt",
            Self::ShareholdersEquity => "shareholders_equity",
            Self::SharesBasic => "shares_basic",
            Self::Price => "price",
            Self::PriceAsof => "price_asof",
            Self::Error => "error",
        }
    }

    /// Whether the field holds a number (as opposed to free text).
    pub const fn is_numeric(&self) -> bool {
        !matches!(self, Self::PriceAsof | Self::Error)
    }

    /// Polars dtype of the column.
    pub fn dtype(&self) -> DataType {
        if self.is_numeric() {
            DataType::Float64
        } else {
            DataType::String
        }
    }

    /// Look up a field by column name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Columns produced by the metrics engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedMetric {
    /// Price times basic shares
    MarketCap,
    /// Total debt less cash
    NetDebt,
    /// Market cap plus net debt
    EnterpriseValue,
    /// Operating income over revenue
    EbitMargin,
    /// EBITDA over revenue
    EbitdaMargin,
    /// Net income over total assets
    Roa,
    /// Net income over shareholders' equity
    Roe,
    /// Current assets over current liabilities
    CurrentRatio,
    /// Current assets less inventory over current liabilities
    QuickRatio,
    /// Total debt over shareholders' equity
    DebtToEquity,
    /// Net debt over EBITDA
    NetDebtToEbitda,
    /// Operating cash flow over revenue
    OcfMargin,
    /// Operating cash flow less absolute capex
    Fcf,
    /// Free cash flow over revenue
    FcfMargin,
    /// Enterprise value over EBITDA
    EvEbitda,
}

impl DerivedMetric {
    /// Every derived metric in computation order.
    pub const ALL: [Self; 15] = [
        Self::MarketCap,
        Self::NetDebt,
        Self::EnterpriseValue,
        Self::EbitMargin,
        Self::EbitdaMargin,
        Self::Roa,
        Self::Roe,
        Self::CurrentRatio,
        Self::QuickRatio,
        Self::DebtToEquity,
        Self::NetDebtToEbitda,
        Self::OcfMargin,
        Self::Fcf,
        Self::FcfMargin,
        Self::EvEbitda,
    ];

    /// Column name of this metric.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MarketCap => "market_cap",
            Self::NetDebt => "net_debt",
            Self::EnterpriseValue => "enterprise_value",
            Self::EbitMargin => "ebit_margin",
            Self::EbitdaMargin => "ebitda_margin",
            Self::Roa => "roa",
            Self::Roe => "roe",
            Self::CurrentRatio => "current_ratio",
            Self::QuickRatio => "quick_ratio",
            Self::DebtToEquity => "debt_to_equity",
            Self::NetDebtToEbitda => "net_debt_to_ebitda",
            Self::OcfMargin => "ocf_margin",
            Self::Fcf => "fcf",
            Self::FcfMargin => "fcf_margin",
            Self::EvEbitda => "ev_ebitda",
        }
    }

    /// Whether the metric is a quotient routed through safe division.
    pub const fn is_ratio(&self) -> bool {
        !matches!(
            self,
            Self::MarketCap | Self::NetDebt | Self::EnterpriseValue | Self::Fcf
        )
    }
}

impl std::fmt::Display for DerivedMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One company's financials in canonical form.
///
/// `None` means the provider did not report the value. A degraded record
/// carries only the ticker and an error note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyFinancials {
    /// Uppercase ticker symbol
    pub ticker: String,
    /// Latest fiscal year covered by the values
    pub fy: Option<i64>,
    /// Total revenue
    pub revenue: Option<f64>,
    /// Operating income
    pub ebit: Option<f64>,
    /// Depreciation and amortization
    pub da: Option<f64>,
    /// EBITDA
    pub ebitda: Option<f64>,
    /// Net income
    pub net_income: Option<f64>,
    /// Total assets
    pub total_assets: Option<f64>,
    /// Total liabilities
    pub total_liabilities: Option<f64>,
    /// Current assets
    pub current_assets: Option<f64>,
    /// Current liabilities
    pub current_liabilities: Option<f64>,
    /// Inventory
    pub inventory: Option<f64>,
    /// Cash and cash equivalents
    pub cash: Option<f64>,
    /// Operating cash flow
    pub operating_cf: Option<f64>,
    /// Capital expenditure
    pub capex: Option<f64>,
    /// Current portion of debt
    pub short_term_debt: Option<f64>,
    /// Non-current debt
    pub long_term_debt: Option<f64>,
    /// Shareholders' equity
    pub shareholders_equity: Option<f64>,
    /// Basic share count
    pub shares_basic: Option<f64>,
    /// Market price per share
    pub price: Option<f64>,
    /// Date the price was observed (YYYY-MM-DD)
    pub price_asof: Option<String>,
    /// Failure note for degraded rows
    pub error: Option<String>,
}

impl CompanyFinancials {
    /// Create an empty record for a ticker.
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            ..Self::default()
        }
    }

    /// Create a degraded record: ticker plus the reason it could not be resolved.
    pub fn degraded(ticker: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            error: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Whether this record stands in for a failed lookup.
    pub const fn is_degraded(&self) -> bool {
        self.error.is_some()
    }

    /// Numeric value of a canonical field. Text fields return `None`.
    pub const fn value(&self, field: CanonicalField) -> Option<f64> {
        match field {
            CanonicalField::Revenue => self.revenue,
            CanonicalField::Ebit => self.ebit,
            CanonicalField::Da => self.da,
            CanonicalField::Ebitda => self.ebitda,
            CanonicalField::NetIncome => self.net_income,
            CanonicalField::TotalAssets => self.total_assets,
            CanonicalField::TotalLiabilities => self.total_liabilities,
            CanonicalField::CurrentAssets => self.current_assets,
            CanonicalField::CurrentLiabilities => self.current_liabilities,
            CanonicalField::Inventory => self.inventory,
            CanonicalField::Cash => self.cash,
            CanonicalField::OperatingCf => self.operating_cf,
            CanonicalField::Capex => self.capex,
            CanonicalField::ShortTermDebt => self.short_term_debt,
            CanonicalField::LongTermDebt => self.long_term_debt,
            CanonicalField::ShareholdersEquity => self.shareholders_equity,
            CanonicalField::SharesBasic => self.shares_basic,
            CanonicalField::Price => self.price,
            CanonicalField::PriceAsof | CanonicalField::Error => None,
        }
    }

    /// Set a numeric canonical field. Text fields are ignored.
    pub fn set_value(&mut self, field: CanonicalField, value: Option<f64>) {
        let slot = match field {
            CanonicalField::Revenue => &mut self.revenue,
            CanonicalField::Ebit => &mut self.ebit,
            CanonicalField::Da => &mut self.da,
            CanonicalField::Ebitda => &mut self.ebitda,
            CanonicalField::NetIncome => &mut self.net_income,
            CanonicalField::TotalAssets => &mut self.total_assets,
            CanonicalField::TotalLiabilities => &mut self.total_liabilities,
            CanonicalField::CurrentAssets => &mut self.current_assets,
            CanonicalField::CurrentLiabilities => &mut self.current_liabilities,
            CanonicalField::Inventory => &mut self.inventory,
            CanonicalField::Cash => &mut self.cash,
            CanonicalField::OperatingCf => &mut self.operating_cf,
            CanonicalField::Capex => &mut self.capex,
            CanonicalField::ShortTermDebt => &mut self.short_term_debt,
            CanonicalField::LongTermDebt => &mut self.long_term_debt,
            CanonicalField::ShareholdersEquity => &mut self.shareholders_equity,
            CanonicalField::SharesBasic => &mut self.shares_basic,
            CanonicalField::Price => &mut self.price,
            CanonicalField::PriceAsof | CanonicalField::Error => return,
        };
        *slot = value;
    }

    fn text(&self, field: CanonicalField) -> Option<&str> {
        match field {
            CanonicalField::PriceAsof => self.price_asof.as_deref(),
            CanonicalField::Error => self.error.as_deref(),
            _ => None,
        }
    }

    /// Build a canonical batch frame from records.
    ///
    /// Columns are `ticker`, `fy`, then every [`CanonicalField`] in order.
    pub fn to_frame(records: &[Self]) -> PolarsResult<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(CanonicalField::ALL.len() + 2);

        let tickers: Vec<&str> = records.iter().map(|r| r.ticker.as_str()).collect();
        columns.push(Series::new(TICKER.into(), tickers).into());

        let years: Vec<Option<i64>> = records.iter().map(|r| r.fy).collect();
        columns.push(Series::new(FISCAL_YEAR.into(), years).into());

        for field in CanonicalField::ALL {
            let series = if field.is_numeric() {
                let values: Vec<Option<f64>> = records.iter().map(|r| r.value(field)).collect();
                Series::new(field.name().into(), values)
            } else {
                let values: Vec<Option<&str>> = records.iter().map(|r| r.text(field)).collect();
                Series::new(field.name().into(), values)
            };
            columns.push(series.into());
        }

        DataFrame::new(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_round_trip() {
        for field in CanonicalField::ALL {
            assert_eq!(CanonicalField::from_name(field.name()), Some(field));
        }
        assert_eq!(CanonicalField::from_name("Revenues"), None);
    }

    #[test]
    fn test_text_fields_are_not_numeric() {
        assert!(!CanonicalField::Error.is_numeric());
        assert!(!CanonicalField::PriceAsof.is_numeric());
        assert_eq!(CanonicalField::Cash.dtype(), DataType::Float64);
        assert_eq!(CanonicalField::Error.dtype(), DataType::String);
    }

    #[test]
    fn test_ratio_classification() {
        let ratios = DerivedMetric::ALL.iter().filter(|m| m.is_ratio()).count();
        assert_eq!(ratios, 11);
        assert!(!DerivedMetric::Fcf.is_ratio());
        assert!(DerivedMetric::FcfMargin.is_ratio());
    }

    #[test]
    fn test_set_value() {
        let mut record = CompanyFinancials::new("AAA");
        record.set_value(CanonicalField::Revenue, Some(100.0));
        record.set_value(CanonicalField::Error, Some(1.0));
        assert_eq!(record.revenue, Some(100.0));
        assert_eq!(record.value(CanonicalField::Revenue), Some(100.0));
        assert!(record.error.is_none());
    }

    #[test]
    fn test_degraded_record() {
        let record = CompanyFinancials::degraded("ZZZZ", "CIK not found");
        assert!(record.is_degraded());
        assert!(record.revenue.is_none());
        assert_eq!(record.error.as_deref(), Some("CIK not found"));
    }

    #[test]
    fn test_to_frame_layout() {
        let mut a = CompanyFinancials::new("AAA");
        a.revenue = Some(100.0);
        a.fy = Some(2023);
        let b = CompanyFinancials::degraded("BBB", "lookup failed");

        let df = CompanyFinancials::to_frame(&[a, b]).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), CanonicalField::ALL.len() + 2);

        let revenue = df.column("revenue").unwrap().f64().unwrap();
        assert_eq!(revenue.get(0), Some(100.0));
        assert_eq!(revenue.get(1), None);

        let errors = df.column("error").unwrap().str().unwrap();
        assert_eq!(errors.get(0), None);
        assert_eq!(errors.get(1), Some("lookup failed"));
    }
}
