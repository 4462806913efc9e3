//! Category weights for the composite score.

use crate::error::{Result, ScoringError};
use crate::registry::MetricCategory;
use serde::{Deserialize, Serialize};

/// Linear weights applied to the four category scores.
///
/// The engine uses the weights as given; they need not sum to one. Call
/// [`ScoreWeights::normalized`] first if a convex combination is wanted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Weight of the profitability category (default: 0.35)
    pub profitability: f64,
    /// Weight of the liquidity category (default: 0.20)
    pub liquidity: f64,
    /// Weight of the leverage category (default: 0.20)
    pub leverage: f64,
    /// Weight of the cash generation category (default: 0.25)
    pub cash_gen: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            profitability: 0.35,
            liquidity: 0.20,
            leverage: 0.20,
            cash_gen: 0.25,
        }
    }
}

impl ScoreWeights {
    /// Create weights from the four components.
    pub const fn new(profitability: f64, liquidity: f64, leverage: f64, cash_gen: f64) -> Self {
        Self {
            profitability,
            liquidity,
            leverage,
            cash_gen,
        }
    }

    /// Weight assigned to a category.
    pub const fn weight_for(&self, category: MetricCategory) -> f64 {
        match category {
            MetricCategory::Profitability => self.profitability,
            MetricCategory::Liquidity => self.liquidity,
            MetricCategory::Leverage => self.leverage,
            MetricCategory::CashGeneration => self.cash_gen,
        }
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        MetricCategory::ALL
            .iter()
            .map(|category| self.weight_for(*category))
            .sum()
    }

    /// Check that every weight is finite and non-negative, and that their
    /// sum is finite.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::InvalidWeight`] naming the first bad component,
    /// or `total` when only the sum overflows.
    pub fn validate(&self) -> Result<()> {
        for category in MetricCategory::ALL {
            let value = self.weight_for(category);
            if !value.is_finite() || value < 0.0 {
                return Err(ScoringError::InvalidWeight {
                    component: category.weight_key(),
                    value,
                });
            }
        }
        let total = self.total();
        if !total.is_finite() {
            return Err(ScoringError::InvalidWeight {
                component: "total",
                value: total,
            });
        }
        Ok(())
    }

    /// Rescale the weights so they sum to one.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::InvalidWeight`] for invalid components and
    /// [`ScoringError::ZeroWeights`] when every weight is zero.
    pub fn normalized(&self) -> Result<Self> {
        self.validate()?;
        let total = self.total();
        if total <= 0.0 {
            return Err(ScoringError::ZeroWeights);
        }
        Ok(Self {
            profitability: self.profitability / total,
            liquidity: self.liquidity / total,
            leverage: self.leverage / total,
            cash_gen: self.cash_gen / total,
        })
    }
}
