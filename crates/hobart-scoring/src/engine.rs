//! Scoring Engine
//!
//! Turns a metrics table into peer z-scores, category scores, a weighted
//! total and a bounded display score, then ranks the batch.

use crate::error::{Result, ScoringError};
use crate::registry::{
    Direction, MetricCategory, metrics_by_category, scored_metrics, zscore_column,
};
use crate::weights::ScoreWeights;
use crate::zscore::PeerStats;
use polars::prelude::*;

/// Composite weighted score column.
pub const SCORE_TOTAL: &str = "score_total";

/// Display score column, bounded to `[0, 100]`.
pub const SCORE_0_100: &str = "score_0_100";

/// Added to the display range so a flat batch never divides by zero.
pub const DISPLAY_EPSILON: f64 = 1e-9;

/// Mean of the defined member columns, null when none is defined.
pub fn category_score_expr(members: &[String]) -> Expr {
    let Some((first, rest)) = members.split_first() else {
        return lit(NULL).cast(DataType::Float64);
    };

    let defined = |name: &str| col(name).is_not_null().cast(DataType::Float64);
    let value = |name: &str| col(name).fill_null(lit(0.0));

    let (sum, count) = rest.iter().fold(
        (value(first), defined(first)),
        |(sum, count), name| (sum + value(name), count + defined(name)),
    );

    when(count.clone().gt(lit(0.0)))
        .then(sum / count)
        .otherwise(lit(NULL))
}

const DISPLAY_BASIS: &str = "__display_basis";

/// `Σ (w / scale) · score` over the categories, undefined categories adding 0.
fn weighted_total(weights: &ScoreWeights, scale: f64) -> Expr {
    MetricCategory::ALL.iter().fold(lit(0.0), |acc, category| {
        acc + lit(weights.weight_for(*category) / scale)
            * col(category.score_column()).fill_null(lit(0.0))
    })
}

/// Null where the value overflowed to ±inf.
fn finite_or_null(expr: Expr) -> Expr {
    when(expr.clone().abs().lt(lit(f64::INFINITY)))
        .then(expr)
        .otherwise(lit(NULL))
}

/// Score and rank a batch of companies.
///
/// The input must hold every scored ratio column (see
/// [`crate::scored_metrics`]). The output keeps all input columns and adds
/// one `z_<metric>` column per scored ratio, the four category scores,
/// [`SCORE_TOTAL`] and [`SCORE_0_100`], sorted by display score descending.
/// Ties keep their input order. A total that overflows `f64` is left
/// undefined; the display score still ranks that row.
///
/// Score columns already present in the input are replaced, so scoring a
/// scored table reproduces the same display scores.
///
/// # Errors
///
/// - [`ScoringError::InvalidWeight`] if a weight is negative or not finite,
///   or the weights do not have a finite sum
/// - [`ScoringError::EmptyBatch`] if the frame has no rows
/// - [`ScoringError::MissingColumn`] if a scored ratio column is absent
pub fn score_companies(metrics: &DataFrame, weights: &ScoreWeights) -> Result<DataFrame> {
    weights.validate()?;
    if metrics.height() == 0 {
        return Err(ScoringError::EmptyBatch);
    }

    let mut zscores = Vec::with_capacity(scored_metrics().len());
    for metric in scored_metrics() {
        let stats = PeerStats::of(metrics, metric.name)?;
        if stats.is_degenerate() {
            tracing::debug!(metric = metric.name, "zero variance across batch");
        }
        let z = stats.zscore_expr(metric.name);
        let z = match metric.direction {
            Direction::HigherIsBetter => z,
            Direction::LowerIsBetter => lit(0.0) - z,
        };
        zscores.push(z.alias(zscore_column(metric.name)));
    }

    let categories: Vec<Expr> = MetricCategory::ALL
        .iter()
        .map(|category| {
            let members: Vec<String> = metrics_by_category(*category)
                .iter()
                .map(|m| zscore_column(m.name))
                .collect();
            category_score_expr(&members).alias(category.score_column())
        })
        .collect();

    let total_weight = weights.total();
    let display_scale = if total_weight > 0.0 { total_weight } else { 1.0 };
    let scored = metrics
        .clone()
        .lazy()
        .with_columns(zscores)
        .with_columns(categories)
        .with_columns([
            finite_or_null(weighted_total(weights, 1.0)).alias(SCORE_TOTAL),
            weighted_total(weights, display_scale).alias(DISPLAY_BASIS),
        ])
        .collect()?;

    // Standardized totals do not depend on the weight scale
    let total_stats = PeerStats::of(&scored, DISPLAY_BASIS)?;
    let display = if total_stats.is_degenerate() || total_stats.std.is_none() {
        lit(0.0)
    } else {
        let z = total_stats.zscore_expr(DISPLAY_BASIS);
        (z.clone() - z.clone().min()) / (z.clone().max() - z.min() + lit(DISPLAY_EPSILON))
            * lit(100.0)
    };

    let ranked = scored
        .lazy()
        // Adding zero turns -0.0 into 0.0
        .with_columns([(display + lit(0.0)).alias(SCORE_0_100)])
        .sort(
            [SCORE_0_100],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        )
        .collect()?
        .drop(DISPLAY_BASIS)?;

    tracing::debug!(
        rows = ranked.height(),
        degenerate = total_stats.is_degenerate(),
        "scored batch"
    );

    Ok(ranked)
}
