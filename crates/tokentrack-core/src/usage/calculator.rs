//! Budget math: percent, remaining, cost, and color band from a raw count.

use super::types::{ColorBand, Pricing, UsageBudget, UsageSample, UsageView};

/// Derive a [`UsageView`] from a raw token count.
///
/// Overruns are kept as-is: `remaining` goes negative and `percent` passes
/// 100. Clamping is left to the renderer.
pub fn compute(count: u64, budget: &UsageBudget, pricing: &Pricing) -> UsageView {
    let total = budget.total_tokens();
    let percent = 100.0 * count as f64 / total as f64;
    let remaining = (total as i128 - count as i128)
        .clamp(i64::MIN as i128, i64::MAX as i128) as i64;

    UsageView {
        current: count,
        total,
        remaining,
        percent,
        estimated_cost_usd: pricing.estimate(count),
        color_band: ColorBand::from_percent(percent),
        split: None,
    }
}

/// Calculator bound to a budget and a pricing model
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageCalculator {
    budget: UsageBudget,
    pricing: Pricing,
}

impl UsageCalculator {
    /// Create a calculator
    pub fn new(budget: UsageBudget, pricing: Pricing) -> Self {
        Self { budget, pricing }
    }

    /// Budget in use
    pub fn budget(&self) -> &UsageBudget {
        &self.budget
    }

    /// Compute the view for a sample, carrying its input/output split through
    pub fn view_for(&self, sample: &UsageSample) -> UsageView {
        let mut view = compute(sample.count, &self.budget, &self.pricing);
        view.split = sample.split;
        view
    }
}
