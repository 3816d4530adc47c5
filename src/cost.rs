//! Token usage and cost accounting.
//!
//! [`compute_cost`] turns the token counts of one invocation into a
//! [`CostInfo`] using the model's per-million-token pricing. The
//! [`CostAccumulator`] keeps the running totals of a run.

use serde::{Deserialize, Serialize};

use crate::registry::Pricing;

/// Token counts reported by the backend for one invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounts {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Token counts and cost (USD) of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostInfo {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub input_cost: f64,
    pub output_cost: f64,
}

impl CostInfo {
    pub fn total_cost(&self) -> f64 {
        self.input_cost + self.output_cost
    }
}

/// Price the usage of one invocation. Pure: no I/O, no shared state.
pub fn compute_cost(usage: UsageCounts, pricing: &Pricing) -> CostInfo {
    CostInfo {
        input_tokens: usage.input_tokens,
        output_tokens: usage.output_tokens,
        input_cost: usage.input_tokens as f64 / 1_000_000.0 * pricing.input_per_million,
        output_cost: usage.output_tokens as f64 / 1_000_000.0 * pricing.output_per_million,
    }
}

/// Read-only snapshot of the run totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostTotals {
    pub jobs: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub input_cost: f64,
    pub output_cost: f64,
}

impl CostTotals {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    pub fn total_cost(&self) -> f64 {
        self.input_cost + self.output_cost
    }
}

/// Running totals across the successful jobs of a run. Only ever grows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostAccumulator {
    totals: CostTotals,
}

impl CostAccumulator {
    pub fn record(&mut self, cost: &CostInfo) {
        self.totals.jobs += 1;
        self.totals.input_tokens += cost.input_tokens;
        self.totals.output_tokens += cost.output_tokens;
        self.totals.input_cost += cost.input_cost;
        self.totals.output_cost += cost.output_cost;
    }

    pub fn snapshot(&self) -> CostTotals {
        self.totals
    }
}
