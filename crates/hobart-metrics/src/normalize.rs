//! Normalization of raw provider tables into the canonical schema.
//!
//! Accepts either the canonical column names or the SEC XBRL concept names,
//! possibly with several fiscal years per ticker, and returns one canonical
//! frame with at most one row per ticker when a `fy` column is present.

use crate::error::{MetricsError, Result};
use crate::schema::{CanonicalField, FISCAL_YEAR, TICKER};
use polars::prelude::*;

/// Provider concept names and the canonical field each one maps to.
pub const PROVIDER_CONCEPTS: [(&str, CanonicalField); 15] = [
    ("Revenues", CanonicalField::Revenue),
    ("OperatingIncomeLoss", CanonicalField::Ebit),
    ("DepreciationAndAmortization", CanonicalField::Da),
    ("NetIncomeLoss", CanonicalField::NetIncome),
    ("Assets", CanonicalField::TotalAssets),
    ("Liabilities", CanonicalField::TotalLiabilities),
    ("AssetsCurrent", CanonicalField::CurrentAssets),
    ("LiabilitiesCurrent", CanonicalField::CurrentLiabilities),
    ("InventoryNet", CanonicalField::Inventory),
    ("CashAndCashEquivalentsAtCarryingValue", CanonicalField::Cash),
    (
        "NetCashProvidedByUsedInOperatingActivities",
        CanonicalField::OperatingCf,
    ),
    (
        "PaymentsToAcquirePropertyPlantAndEquipment",
        CanonicalField::Capex,
    ),
    ("LongTermDebtNoncurrent", CanonicalField::LongTermDebt),
    ("LongTermDebtCurrent", CanonicalField::ShortTermDebt),
    ("StockholdersEquity", CanonicalField::ShareholdersEquity),
];

const ROW_INDEX: &str = "__row_index";

/// Normalize a raw financials table.
///
/// Steps, in order:
/// 1. provider concept columns are renamed to canonical names (unless the
///    canonical column already exists, in which case the provider column passes
///    through untouched);
/// 2. tickers are trimmed and uppercased;
/// 3. canonical columns the input lacks are added as all-null columns;
/// 4. `ebitda` is filled from `ebit + da` where it is null;
/// 5. every numeric input column other than `ticker` and `fy` is widened to
///    `Float64` with nulls replaced by zero (text columns are left alone);
/// 6. if `fy` is present, only the latest fiscal year per ticker is kept.
///
/// # Errors
///
/// Returns [`MetricsError::EmptyBatch`] for an input with no rows and
/// [`MetricsError::MissingColumn`] when there is no `ticker` column.
pub fn normalize_financials(raw: &DataFrame) -> Result<DataFrame> {
    if raw.height() == 0 {
        return Err(MetricsError::EmptyBatch);
    }
    if raw.column(TICKER).is_err() {
        return Err(MetricsError::MissingColumn(TICKER.to_string()));
    }

    let mut df = raw.clone();
    rename_provider_columns(&mut df)?;
    normalize_tickers(&mut df)?;

    // Zero-fill applies to the columns the caller supplied, not to the
    // canonical columns added below, which stay unknown.
    let zero_fill: Vec<Expr> = df
        .get_columns()
        .iter()
        .filter(|c| !matches!(c.name().as_str(), TICKER | FISCAL_YEAR))
        .filter(|c| is_numeric_dtype(c.dtype()))
        .map(|c| {
            let name = c.name().as_str();
            col(name)
                .cast(DataType::Float64)
                .fill_nan(lit(0.0))
                .fill_null(lit(0.0))
                .alias(name)
        })
        .collect();

    let missing: Vec<Expr> = CanonicalField::ALL
        .iter()
        .filter(|field| df.column(field.name()).is_err())
        .map(|field| lit(NULL).cast(field.dtype()).alias(field.name()))
        .collect();

    let has_fiscal_year = df.column(FISCAL_YEAR).is_ok();
    let ebitda_fill = derive_ebitda(&df);

    let mut lf = df.lazy();
    if !missing.is_empty() {
        lf = lf.with_columns(missing);
    }
    if let Some(expr) = ebitda_fill {
        lf = lf.with_columns([expr]);
    }
    if !zero_fill.is_empty() {
        lf = lf.with_columns(zero_fill);
    }

    let normalized = if has_fiscal_year {
        lf.sort(
            [TICKER, FISCAL_YEAR],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .with_row_index(ROW_INDEX, None)
        .filter(col(ROW_INDEX).eq(col(ROW_INDEX).max().over([col(TICKER)])))
        .collect()?
        .drop(ROW_INDEX)?
    } else {
        lf.collect()?
    };

    tracing::debug!(
        input_rows = raw.height(),
        output_rows = normalized.height(),
        latest_fy_only = has_fiscal_year,
        "normalized financials"
    );

    Ok(normalized)
}

/// Rename provider concept columns to their canonical names.
fn rename_provider_columns(df: &mut DataFrame) -> Result<()> {
    for (concept, field) in PROVIDER_CONCEPTS {
        if df.column(concept).is_ok() && df.column(field.name()).is_err() {
            df.rename(concept, field.name().into())?;
        }
    }
    Ok(())
}

/// Trim and uppercase the ticker column, casting it to text first.
fn normalize_tickers(df: &mut DataFrame) -> Result<()> {
    let tickers = df.column(TICKER)?.cast(&DataType::String)?;
    let normalized: StringChunked = tickers
        .str()?
        .into_iter()
        .map(|t| t.map(|s| s.trim().to_uppercase()))
        .collect();
    df.with_column(normalized.with_name(TICKER.into()).into_series())?;
    Ok(())
}

/// Expression filling null `ebitda` from `ebit + da`.
///
/// Only built when all three columns are numeric or absent; absent ones are
/// materialized as null before the expression runs.
fn derive_ebitda(df: &DataFrame) -> Option<Expr> {
    let fields = [
        CanonicalField::Ebitda,
        CanonicalField::Ebit,
        CanonicalField::Da,
    ];
    let numeric_or_absent = fields.iter().all(|field| {
        df.column(field.name())
            .map_or(true, |c| is_numeric_dtype(c.dtype()))
    });
    if !numeric_or_absent {
        return None;
    }

    let ebitda = col(CanonicalField::Ebitda.name()).cast(DataType::Float64);
    let ebit = col(CanonicalField::Ebit.name()).cast(DataType::Float64);
    let da = col(CanonicalField::Da.name()).cast(DataType::Float64);

    Some(
        when(ebitda.clone().is_null())
            .then(ebit + da)
            .otherwise(ebitda)
            .alias(CanonicalField::Ebitda.name()),
    )
}

/// Whether a dtype counts as numeric for zero-filling: any integer or float
/// width, and booleans.
pub(crate) fn is_numeric_dtype(dtype: &DataType) -> bool {
    dtype.is_primitive_numeric() || dtype.is_bool()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(columns: Vec<Column>) -> DataFrame {
        DataFrame::new(columns).unwrap()
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        let df = frame(vec![
            Series::new("ticker".into(), Vec::<&str>::new()).into(),
        ]);
        assert!(matches!(
            normalize_financials(&df),
            Err(MetricsError::EmptyBatch)
        ));
    }

    #[test]
    fn test_missing_ticker_is_rejected() {
        let df = frame(vec![Series::new("revenue".into(), vec![1.0]).into()]);
        assert!(matches!(
            normalize_financials(&df),
            Err(MetricsError::MissingColumn(c)) if c == "ticker"
        ));
    }

    #[test]
    fn test_provider_concepts_are_renamed() {
        let df = frame(vec![
            Series::new("ticker".into(), vec!["aaa"]).into(),
            Series::new("Revenues".into(), vec![100.0]).into(),
            Series::new("StockholdersEquity".into(), vec![40.0]).into(),
            Series::new("segment".into(), vec!["retail"]).into(),
        ]);

        let out = normalize_financials(&df).unwrap();
        assert_eq!(out.column("revenue").unwrap().f64().unwrap().get(0), Some(100.0));
        assert_eq!(
            out.column("shareholders_equity").unwrap().f64().unwrap().get(0),
            Some(40.0)
        );
        assert!(out.column("Revenues").is_err());
        assert_eq!(out.column("segment").unwrap().str().unwrap().get(0), Some("retail"));
        assert_eq!(out.column("ticker").unwrap().str().unwrap().get(0), Some("AAA"));
    }

    #[test]
    fn test_canonical_column_wins_over_provider_alias() {
        let df = frame(vec![
            Series::new("ticker".into(), vec!["AAA"]).into(),
            Series::new("revenue".into(), vec![10.0]).into(),
            Series::new("Revenues".into(), vec![99.0]).into(),
        ]);

        let out = normalize_financials(&df).unwrap();
        assert_eq!(out.column("revenue").unwrap().f64().unwrap().get(0), Some(10.0));
        assert!(out.column("Revenues").is_ok());
    }

    #[test]
    fn test_numeric_nulls_are_zero_filled_text_untouched() {
        let df = frame(vec![
            Series::new("ticker".into(), vec!["AAA", "BBB"]).into(),
            Series::new("inventory".into(), vec![Some(5i64), None]).into(),
            Series::new("error".into(), vec![None, Some("CIK not found")]).into(),
        ]);

        let out = normalize_financials(&df).unwrap();
        let inventory = out.column("inventory").unwrap().f64().unwrap();
        assert_eq!(inventory.get(0), Some(5.0));
        assert_eq!(inventory.get(1), Some(0.0));

        let errors = out.column("error").unwrap().str().unwrap();
        assert_eq!(errors.get(0), None);
        assert_eq!(errors.get(1), Some("CIK not found"));
    }

    #[test]
    fn test_narrow_and_boolean_columns_are_zero_filled() {
        let df = frame(vec![
            Series::new("ticker".into(), vec!["AAA", "BBB"]).into(),
            Series::new("inventory".into(), vec![Some(5i16), None]).into(),
            Series::new("cash".into(), vec![None, Some(3u8)]).into(),
            Series::new("audited".into(), vec![Some(true), None]).into(),
        ]);

        let out = normalize_financials(&df).unwrap();
        for (name, expected) in [
            ("inventory", [Some(5.0), Some(0.0)]),
            ("cash", [Some(0.0), Some(3.0)]),
            ("audited", [Some(1.0), Some(0.0)]),
        ] {
            let column = out.column(name).unwrap();
            assert_eq!(column.dtype(), &DataType::Float64, "{name}");
            let values: Vec<Option<f64>> = column.f64().unwrap().into_iter().collect();
            assert_eq!(values, expected, "{name}");
        }
    }

    #[test]
    fn test_absent_canonical_columns_stay_unknown() {
        let df = frame(vec![Series::new("ticker".into(), vec!["AAA"]).into()]);

        let out = normalize_financials(&df).unwrap();
        for field in CanonicalField::ALL {
            let column = out.column(field.name()).unwrap();
            assert_eq!(column.dtype(), &field.dtype());
            assert_eq!(column.null_count(), 1, "{field} should be null");
        }
    }

    #[test]
    fn test_ebitda_derived_from_ebit_and_da() {
        let df = frame(vec![
            Series::new("ticker".into(), vec!["AAA", "BBB", "CCC"]).into(),
            Series::new("ebit".into(), vec![Some(10.0), Some(30.0), None]).into(),
            Series::new("da".into(), vec![Some(10.0), Some(10.0), Some(4.0)]).into(),
            Series::new("ebitda".into(), vec![None, Some(45.0), None]).into(),
        ]);

        let out = normalize_financials(&df).unwrap();
        let ebitda = out.column("ebitda").unwrap().f64().unwrap();
        assert_eq!(ebitda.get(0), Some(20.0));
        assert_eq!(ebitda.get(1), Some(45.0));
        // ebit unknown: nothing to derive, then zero-filled
        assert_eq!(ebitda.get(2), Some(0.0));
    }

    #[test]
    fn test_latest_fiscal_year_wins() {
        let df = frame(vec![
            Series::new("ticker".into(), vec!["BBB", "AAA", "AAA", "BBB", "AAA"]).into(),
            Series::new("fy".into(), vec![2022i64, 2023, 2021, 2021, 2022]).into(),
            Series::new("revenue".into(), vec![220.0, 123.0, 121.0, 210.0, 122.0]).into(),
        ]);

        let out = normalize_financials(&df).unwrap();
        assert_eq!(out.height(), 2);

        let tickers = out.column("ticker").unwrap().str().unwrap();
        let years = out.column("fy").unwrap().i64().unwrap();
        let revenue = out.column("revenue").unwrap().f64().unwrap();
        assert_eq!(tickers.get(0), Some("AAA"));
        assert_eq!(years.get(0), Some(2023));
        assert_eq!(revenue.get(0), Some(123.0));
        assert_eq!(tickers.get(1), Some("BBB"));
        assert_eq!(years.get(1), Some(2022));
        assert_eq!(revenue.get(1), Some(220.0));
        assert!(out.column(ROW_INDEX).is_err());
    }

    #[test]
    fn test_without_fiscal_year_rows_pass_through() {
        let df = frame(vec![
            Series::new("ticker".into(), vec!["BBB", "AAA", "BBB"]).into(),
            Series::new("revenue".into(), vec![1.0, 2.0, 3.0]).into(),
        ]);

        let out = normalize_financials(&df).unwrap();
        assert_eq!(out.height(), 3);
        let revenue = out.column("revenue").unwrap().f64().unwrap();
        assert_eq!(revenue.get(0), Some(1.0));
        assert_eq!(revenue.get(2), Some(3.0));
    }

    #[test]
    fn test_row_without_financials_is_retained() {
        let df = frame(vec![
            Series::new("ticker".into(), vec!["AAA", "ZZZ"]).into(),
            Series::new("revenue".into(), vec![Some(100.0), None]).into(),
        ]);

        let out = normalize_financials(&df).unwrap();
        assert_eq!(out.height(), 2);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let df = frame(vec![
            Series::new("ticker".into(), vec!["aaa"]).into(),
            Series::new("Revenues".into(), vec![Some(1.0)]).into(),
        ]);
        let before = df.clone();
        normalize_financials(&df).unwrap();
        assert!(df.equals_missing(&before));
    }
}
