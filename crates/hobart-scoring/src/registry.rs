//! Metric Registry
//!
//! Static metadata for every metric that feeds the composite score: which
//! category it belongs to and whether a higher value is better.

use serde::{Deserialize, Serialize};

/// Score categories combined into the total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    /// Margins and returns
    Profitability,
    /// Short-term solvency
    Liquidity,
    /// Balance sheet gearing
    Leverage,
    /// Cash conversion
    CashGeneration,
}

impl MetricCategory {
    /// All categories in weighting order.
    pub const ALL: [Self; 4] = [
        Self::Profitability,
        Self::Liquidity,
        Self::Leverage,
        Self::CashGeneration,
    ];

    /// Column holding the category score.
    pub const fn score_column(&self) -> &'static str {
        match self {
            Self::Profitability => "score_profitability",
            Self::Liquidity => "score_liquidity",
            Self::Leverage => "score_leverage",
            Self::CashGeneration => "score_cash",
        }
    }

    /// Key of the category in [`crate::ScoreWeights`].
    pub const fn weight_key(&self) -> &'static str {
        match self {
            Self::Profitability => "profitability",
            Self::Liquidity => "liquidity",
            Self::Leverage => "leverage",
            Self::CashGeneration => "cash_gen",
        }
    }
}

impl std::fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Profitability => "Profitability",
            Self::Liquidity => "Liquidity",
            Self::Leverage => "Leverage",
            Self::CashGeneration => "Cash generation",
        };
        f.write_str(label)
    }
}

/// Whether larger raw values improve the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Larger is healthier
    HigherIsBetter,
    /// Smaller is healthier; the z-score is negated
    LowerIsBetter,
}

/// Scored metric metadata
#[derive(Debug, Clone)]
pub struct MetricInfo {
    /// Metric column name
    pub name: &'static str,
    /// Category the metric scores into
    pub category: MetricCategory,
    /// Sign convention
    pub direction: Direction,
    /// Brief description of what the metric measures
    pub description: &'static str,
}

static SCORED_METRICS: [MetricInfo; 9] = [
    // Profitability
    MetricInfo {
        name: "ebit_margin",
        category: MetricCategory::Profitability,
        direction: Direction::HigherIsBetter,
        description: "Operating income over revenue",
    },
    MetricInfo {
        name: "ebitda_margin",
        category: MetricCategory::Profitability,
        direction: Direction::HigherIsBetter,
        description: "EBITDA over revenue",
    },
    MetricInfo {
        name: "roa",
        category: MetricCategory::Profitability,
        direction: Direction::HigherIsBetter,
        description: "Return on assets - net income over total assets",
    },
    MetricInfo {
        name: "roe",
        category: MetricCategory::Profitability,
        direction: Direction::HigherIsBetter,
        description: "Return on equity - net income over shareholders' equity",
    },
    // Liquidity
    MetricInfo {
        name: "current_ratio",
        category: MetricCategory::Liquidity,
        direction: Direction::HigherIsBetter,
        description: "Current assets over current liabilities",
    },
    MetricInfo {
        name: "quick_ratio",
        category: MetricCategory::Liquidity,
        direction: Direction::HigherIsBetter,
        description: "Current assets excluding inventory over current liabilities",
    },
    // Leverage
    MetricInfo {
        name: "debt_to_equity",
        category: MetricCategory::Leverage,
        direction: Direction::LowerIsBetter,
        description: "Short and long-term debt over shareholders' equity",
    },
    // Cash generation
    MetricInfo {
        name: "ocf_margin",
        category: MetricCategory::CashGeneration,
        direction: Direction::HigherIsBetter,
        description: "Operating cash flow over revenue",
    },
    MetricInfo {
        name: "fcf_margin",
        category: MetricCategory::CashGeneration,
        direction: Direction::HigherIsBetter,
        description: "Free cash flow over revenue",
    },
];

/// All metrics that feed the composite score.
pub fn scored_metrics() -> &'static [MetricInfo] {
    &SCORED_METRICS
}

/// Metrics scored into one category.
pub fn metrics_by_category(category: MetricCategory) -> Vec<&'static MetricInfo> {
    SCORED_METRICS
        .iter()
        .filter(|m| m.category == category)
        .collect()
}

/// Look up a scored metric by column name.
pub fn get_metric_info(name: &str) -> Option<&'static MetricInfo> {
    SCORED_METRICS.iter().find(|m| m.name == name)
}

/// Name of the z-score column for a metric.
pub fn zscore_column(metric: &str) -> String {
    format!("z_{metric}")
}
