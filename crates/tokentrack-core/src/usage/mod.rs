//! Usage model: raw samples, the fixed budget, and the derived view.

pub mod calculator;
pub mod types;

pub use calculator::{compute, UsageCalculator};
pub use types::{
    BudgetError, ColorBand, Pricing, TokenSplit, UsageBudget, UsageSample, UsageView,
    DEFAULT_COST_PER_THOUSAND_USD, DEFAULT_TOTAL_TOKENS,
};
