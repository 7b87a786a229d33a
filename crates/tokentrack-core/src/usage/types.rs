//! Usage data types: raw samples, the fixed budget, and the derived view.

use std::num::NonZeroU64;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default token budget (200k tokens)
pub const DEFAULT_TOTAL_TOKENS: u64 = 200_000;

/// Default flat rate in USD per 1000 tokens
pub const DEFAULT_COST_PER_THOUSAND_USD: f64 = 0.01;

/// Error building usage configuration values
#[derive(Debug, Error, PartialEq)]
pub enum BudgetError {
    /// Budget must hold at least one token
    #[error("token budget must be greater than zero")]
    ZeroBudget,

    /// Cost rate must be finite and non-negative
    #[error("invalid cost per 1000 tokens: {0}")]
    InvalidRate(f64),
}

/// Input/output breakdown of a token count, when the source reports one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSplit {
    /// Prompt (input) tokens
    pub input: u64,
    /// Completion (output) tokens
    pub output: u64,
}

impl TokenSplit {
    /// Combined input + output
    pub fn total(&self) -> u64 {
        self.input.saturating_add(self.output)
    }
}

/// A single observation of the cumulative token count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageSample {
    /// Raw token count
    pub count: u64,
    /// When the count was observed
    pub observed_at: DateTime<Utc>,
    /// Input/output breakdown (remote gateway only)
    pub split: Option<TokenSplit>,
}

impl UsageSample {
    /// Sample observed now with no breakdown
    pub fn now(count: u64) -> Self {
        Self {
            count,
            observed_at: Utc::now(),
            split: None,
        }
    }

    /// Sample observed now, built from an input/output breakdown
    pub fn from_split(split: TokenSplit) -> Self {
        Self {
            count: split.total(),
            observed_at: Utc::now(),
            split: Some(split),
        }
    }
}

/// Fixed token ceiling the percentage is computed against.
///
/// Zero is unrepresentable, so percent math never divides by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageBudget {
    total_tokens: NonZeroU64,
}

impl UsageBudget {
    /// Create a budget, rejecting zero
    pub fn new(total_tokens: u64) -> Result<Self, BudgetError> {
        NonZeroU64::new(total_tokens)
            .map(|total_tokens| Self { total_tokens })
            .ok_or(BudgetError::ZeroBudget)
    }

    /// Total tokens in the budget
    pub fn total_tokens(&self) -> u64 {
        self.total_tokens.get()
    }
}

impl Default for UsageBudget {
    fn default() -> Self {
        Self {
            total_tokens: NonZeroU64::new(DEFAULT_TOTAL_TOKENS).unwrap_or(NonZeroU64::MIN),
        }
    }
}

/// Flat-rate cost model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pricing {
    per_thousand_usd: f64,
}

impl Pricing {
    /// Create a pricing model with the given USD rate per 1000 tokens
    pub fn new(per_thousand_usd: f64) -> Result<Self, BudgetError> {
        if !per_thousand_usd.is_finite() || per_thousand_usd < 0.0 {
            return Err(BudgetError::InvalidRate(per_thousand_usd));
        }
        Ok(Self { per_thousand_usd })
    }

    /// USD per 1000 tokens
    pub fn per_thousand_usd(&self) -> f64 {
        self.per_thousand_usd
    }

    /// Estimated cost of `count` tokens
    pub fn estimate(&self, count: u64) -> f64 {
        (count as f64 / 1000.0) * self.per_thousand_usd
    }
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            per_thousand_usd: DEFAULT_COST_PER_THOUSAND_USD,
        }
    }
}

/// Severity band derived from percent-of-budget consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorBand {
    /// Below 50%
    Low,
    /// 50% up to (not including) 80%
    Medium,
    /// 80% and above
    High,
}

impl ColorBand {
    /// Lower bound (inclusive) of the Medium band
    pub const MEDIUM_THRESHOLD: f64 = 50.0;
    /// Lower bound (inclusive) of the High band
    pub const HIGH_THRESHOLD: f64 = 80.0;

    /// Classify a percentage
    pub fn from_percent(percent: f64) -> Self {
        if percent >= Self::HIGH_THRESHOLD {
            ColorBand::High
        } else if percent >= Self::MEDIUM_THRESHOLD {
            ColorBand::Medium
        } else {
            ColorBand::Low
        }
    }
}

/// Derived usage figures, recomputed on every refresh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageView {
    /// Tokens consumed
    pub current: u64,
    /// Budget size the view was computed against
    pub total: u64,
    /// `total - current`; negative on overrun
    pub remaining: i64,
    /// `100 * current / total`; may exceed 100
    pub percent: f64,
    /// Flat-rate cost estimate in USD
    pub estimated_cost_usd: f64,
    /// Severity band
    pub color_band: ColorBand,
    /// Input/output breakdown, passed through from the sample
    pub split: Option<TokenSplit>,
}

impl UsageView {
    /// Gauge fill ratio clamped to `0.0..=1.0`
    pub fn display_ratio(&self) -> f64 {
        (self.percent / 100.0).clamp(0.0, 1.0)
    }

    /// Whether usage has gone past the budget
    pub fn is_over_budget(&self) -> bool {
        self.remaining < 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_rejects_zero() {
        assert_eq!(UsageBudget::new(0), Err(BudgetError::ZeroBudget));
        assert_eq!(UsageBudget::new(1).unwrap().total_tokens(), 1);
    }

    #[test]
    fn test_default_budget() {
        assert_eq!(UsageBudget::default().total_tokens(), 200_000);
    }

    #[test]
    fn test_pricing_rejects_bad_rates() {
        assert!(Pricing::new(-0.5).is_err());
        assert!(Pricing::new(f64::NAN).is_err());
        assert!(Pricing::new(f64::INFINITY).is_err());
        assert!(Pricing::new(0.0).is_ok());
    }

    #[test]
    fn test_color_band_thresholds() {
        assert_eq!(ColorBand::from_percent(0.0), ColorBand::Low);
        assert_eq!(ColorBand::from_percent(49.999), ColorBand::Low);
        assert_eq!(ColorBand::from_percent(50.0), ColorBand::Medium);
        assert_eq!(ColorBand::from_percent(79.999), ColorBand::Medium);
        assert_eq!(ColorBand::from_percent(80.0), ColorBand::High);
        assert_eq!(ColorBand::from_percent(250.0), ColorBand::High);
    }

    #[test]
    fn test_split_total() {
        let split = TokenSplit {
            input: 1200,
            output: 300,
        };
        assert_eq!(split.total(), 1500);
        let sample = UsageSample::from_split(split);
        assert_eq!(sample.count, 1500);
        assert_eq!(sample.split, Some(split));
    }
}
