//! Financial ratio engine.
//!
//! Derives size, capital structure, profitability, liquidity, leverage and cash
//! generation metrics from a normalized frame. Each row is computed on its own;
//! no statistic spans the batch here.
//!
//! Division goes through [`safe_div`]: a denominator within `1e-12` of zero,
//! or a quotient that is not finite, produces null rather than infinity.

use crate::error::Result;
use crate::schema::{CanonicalField, DerivedMetric};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Denominators with an absolute value at or below this are treated as zero.
pub const DIVISION_EPSILON: f64 = 1e-12;

/// Columns the engine reads, besides price and share count.
const INPUT_FIELDS: [CanonicalField; 14] = [
    CanonicalField::Revenue,
    CanonicalField::Ebit,
    CanonicalField::Ebitda,
    CanonicalField::NetIncome,
    CanonicalField::TotalAssets,
    CanonicalField::CurrentAssets,
    CanonicalField::CurrentLiabilities,
    CanonicalField::Inventory,
    CanonicalField::Cash,
    CanonicalField::OperatingCf,
    CanonicalField::Capex,
    CanonicalField::ShortTermDebt,
    CanonicalField::LongTermDebt,
    CanonicalField::ShareholdersEquity,
];

/// Configuration for the metrics engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Column holding the share price (default: `price`)
    pub price_column: String,
    /// Column holding the share count (default: `shares_basic`)
    pub shares_column: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            price_column: CanonicalField::Price.name().to_string(),
            shares_column: CanonicalField::SharesBasic.name().to_string(),
        }
    }
}

/// Divide two expressions, yielding null when the denominator is within
/// [`DIVISION_EPSILON`] of zero or the quotient is not finite.
pub fn safe_div(numerator: Expr, denominator: Expr) -> Expr {
    let quotient = numerator / denominator.clone();
    when(
        denominator
            .abs()
            .gt(lit(DIVISION_EPSILON))
            .and(quotient.clone().abs().lt(lit(f64::INFINITY))),
    )
    .then(quotient)
    .otherwise(lit(NULL))
}

/// Compute all derived metrics with the default price and share columns.
///
/// # Errors
///
/// Returns an error only if polars fails to evaluate the plan.
pub fn compute_metrics(normalized: &DataFrame) -> Result<DataFrame> {
    compute_metrics_with(normalized, &MetricsConfig::default())
}

/// Compute all derived metrics.
///
/// The result holds every input column unchanged plus one column per
/// [`DerivedMetric`], with the same rows in the same order.
///
/// # Errors
///
/// Returns an error only if polars fails to evaluate the plan.
pub fn compute_metrics_with(normalized: &DataFrame, config: &MetricsConfig) -> Result<DataFrame> {
    let inputs = Inputs::new(normalized, config);

    let price = inputs.total(&config.price_column);
    let shares = inputs.total(&config.shares_column);
    let revenue = inputs.field(CanonicalField::Revenue);
    let ebit = inputs.field(CanonicalField::Ebit);
    let ebitda = inputs.field(CanonicalField::Ebitda);
    let net_income = inputs.field(CanonicalField::NetIncome);
    let total_assets = inputs.field(CanonicalField::TotalAssets);
    let current_assets = inputs.field(CanonicalField::CurrentAssets);
    let current_liabilities = inputs.field(CanonicalField::CurrentLiabilities);
    let inventory = inputs.field(CanonicalField::Inventory);
    let cash = inputs.field(CanonicalField::Cash);
    let operating_cf = inputs.field(CanonicalField::OperatingCf);
    let capex = inputs.field(CanonicalField::Capex);
    let equity = inputs.field(CanonicalField::ShareholdersEquity);
    let total_debt = inputs.field(CanonicalField::ShortTermDebt)
        + inputs.field(CanonicalField::LongTermDebt);

    let metrics = normalized
        .clone()
        .lazy()
        // Size and capital structure
        .with_columns([
            (price * shares).alias(DerivedMetric::MarketCap.name()),
            (total_debt.clone() - cash).alias(DerivedMetric::NetDebt.name()),
            (operating_cf.clone() - capex.abs()).alias(DerivedMetric::Fcf.name()),
        ])
        .with_columns([(col(DerivedMetric::MarketCap.name())
            + col(DerivedMetric::NetDebt.name()))
        .alias(DerivedMetric::EnterpriseValue.name())])
        .with_columns([
            // Profitability
            safe_div(ebit, revenue.clone()).alias(DerivedMetric::EbitMargin.name()),
            safe_div(ebitda.clone(), revenue.clone()).alias(DerivedMetric::EbitdaMargin.name()),
            safe_div(net_income.clone(), total_assets).alias(DerivedMetric::Roa.name()),
            safe_div(net_income, equity.clone()).alias(DerivedMetric::Roe.name()),
            // Liquidity and working capital
            safe_div(current_assets.clone(), current_liabilities.clone())
                .alias(DerivedMetric::CurrentRatio.name()),
            safe_div(current_assets - inventory, current_liabilities)
                .alias(DerivedMetric::QuickRatio.name()),
            // Leverage
            safe_div(total_debt, equity).alias(DerivedMetric::DebtToEquity.name()),
            safe_div(col(DerivedMetric::NetDebt.name()), ebitda.clone())
                .alias(DerivedMetric::NetDebtToEbitda.name()),
            // Cash generation
            safe_div(operating_cf, revenue.clone()).alias(DerivedMetric::OcfMargin.name()),
            safe_div(col(DerivedMetric::Fcf.name()), revenue)
                .alias(DerivedMetric::FcfMargin.name()),
            safe_div(col(DerivedMetric::EnterpriseValue.name()), ebitda)
                .alias(DerivedMetric::EvEbitda.name()),
        ])
        .collect()?;

    tracing::debug!(rows = metrics.height(), "computed financial metrics");

    Ok(metrics)
}

/// Resolves input columns to zero-defaulted totals.
struct Inputs {
    present: HashSet<String>,
}

impl Inputs {
    fn new(frame: &DataFrame, config: &MetricsConfig) -> Self {
        let wanted: HashSet<&str> = INPUT_FIELDS
            .iter()
            .map(|field| field.name())
            .chain([config.price_column.as_str(), config.shares_column.as_str()])
            .collect();
        let present = frame
            .get_column_names()
            .into_iter()
            .map(|name| name.as_str())
            .filter(|name| wanted.contains(name))
            .map(str::to_string)
            .collect();
        Self { present }
    }

    fn field(&self, field: CanonicalField) -> Expr {
        self.total(field.name())
    }

    /// A column as a finite `Float64`, with anything unparseable, missing or
    /// non-finite resolved to `0.0`. An absent column reads as all zeros.
    fn total(&self, name: &str) -> Expr {
        if !self.present.contains(name) {
            return lit(0.0);
        }
        let value = col(name).cast(DataType::Float64);
        when(value.clone().abs().lt(lit(f64::INFINITY)))
            .then(value)
            .otherwise(lit(0.0))
    }
}
