//! Scoring driven from normalized financials.

use approx::assert_relative_eq;
use hobart_metrics::{compute_metrics, normalize_financials};
use hobart_scoring::{SCORE_0_100, SCORE_TOTAL, ScoreWeights, score_companies};
use polars::prelude::*;

fn raw_batch() -> DataFrame {
    df! {
        "ticker" => ["a", "b"],
        "revenue" => [100.0, 200.0],
        "ebit" => [10.0, 30.0],
        "ebitda" => [20.0, 40.0],
        "net_income" => [8.0, 18.0],
        "total_assets" => [80.0, 300.0],
        "shareholders_equity" => [40.0, 150.0],
        "current_assets" => [30.0, 60.0],
        "current_liabilities" => [20.0, 50.0],
        "inventory" => [5.0, 10.0],
        "operating_cf" => [12.0, 36.0],
        "capex" => [-5.0, -10.0],
        "short_term_debt" => [2.0, 5.0],
        "long_term_debt" => [8.0, 20.0],
        "cash" => [3.0, 4.0],
        "shares_basic" => [10.0, 20.0],
        "price" => [5.0, 10.0],
    }
    .unwrap()
}

fn score(weights: &ScoreWeights) -> DataFrame {
    let metrics = compute_metrics(&normalize_financials(&raw_batch()).unwrap()).unwrap();
    score_companies(&metrics, weights).unwrap()
}

fn column(df: &DataFrame, name: &str) -> Vec<f64> {
    df.column(name)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap())
        .collect()
}

fn tickers(df: &DataFrame) -> Vec<String> {
    df.column("ticker")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|t| t.unwrap().to_string())
        .collect()
}

#[test]
fn test_two_company_ranking_is_deterministic() {
    let scored = score(&ScoreWeights::default());

    // B leads on cash generation and leverage, A on liquidity
    assert_eq!(tickers(&scored), vec!["B", "A"]);
    let total = column(&scored, SCORE_TOTAL);
    assert_relative_eq!(total[0], 0.1625, epsilon = 1e-12);
    assert_relative_eq!(total[1], -0.1625, epsilon = 1e-12);

    let display = column(&scored, SCORE_0_100);
    assert_relative_eq!(display[1], 0.0);
    assert!(display[0] > 99.0 && display[0] <= 100.0);

    for _ in 0..3 {
        assert_eq!(tickers(&score(&ScoreWeights::default())), vec!["B", "A"]);
    }
}

#[test]
fn test_liquidity_only_weights_flip_the_ranking() {
    let scored = score(&ScoreWeights::new(0.0, 1.0, 0.0, 0.0));
    assert_eq!(tickers(&scored), vec!["A", "B"]);
}

#[test]
fn test_scored_table_keeps_metrics() {
    let scored = score(&ScoreWeights::default());
    // Rows were reordered, so B's market cap comes first
    assert_eq!(column(&scored, "market_cap"), vec![200.0, 50.0]);
    assert_eq!(column(&scored, "current_ratio"), vec![1.2, 1.5]);
}
