//! Allocation of budget change amounts.
//!
//! Every function here maps a list of [`BudgetDemand`]s (one per *unique*
//! budget resource, never one per campaign row) to a list of change amounts of
//! the same length and order. The amounts are deltas to apply, not new
//! absolute budgets.
//!
//! A demand is valid when its current budget is positive. Invalid demands
//! always receive `0.0`.

use crate::{CapPolicy, DistributionStrategy, Step};

/// The inputs one budget resource contributes to an allocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetDemand {
    pub current_budget: f64,
    /// KPI weight; missing values are passed as `0.0`.
    pub kpi_value: f64,
}

impl BudgetDemand {
    pub fn new(current_budget: f64, kpi_value: f64) -> Self {
        Self {
            current_budget,
            kpi_value,
        }
    }

    fn is_valid(&self) -> bool {
        self.current_budget > 0.0
    }
}

/// Computes one change amount per demand for the given cap policy.
pub fn allocate(demands: &[BudgetDemand], cap: &CapPolicy) -> Vec<f64> {
    match *cap {
        CapPolicy::PerCampaign {
            step,
            max_change_per_campaign,
        } => per_campaign(demands, step, max_change_per_campaign),
        CapPolicy::TotalBudget { total, strategy } => strategy.distribute(demands, total),
    }
}

/// Per-campaign mode: every budget moves by the same step, capped at `max_change`.
pub fn per_campaign(demands: &[BudgetDemand], step: Step, max_change: f64) -> Vec<f64> {
    demands
        .iter()
        .map(|demand| {
            if demand.current_budget == 0.0 {
                return 0.0;
            }
            let change = match step {
                Step::Absolute(amount) => amount,
                Step::Percentage(pct) => demand.current_budget * (pct / 100.0),
            };
            change.min(max_change)
        })
        .collect()
}

impl DistributionStrategy {
    /// Splits `total` across the valid demands.
    pub fn distribute(self, demands: &[BudgetDemand], total: f64) -> Vec<f64> {
        let valid: Vec<usize> = demands
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_valid())
            .map(|(i, _)| i)
            .collect();

        let mut allocations = vec![0.0; demands.len()];
        if valid.is_empty() {
            return allocations;
        }

        match self {
            DistributionStrategy::Equal => equal_split(&valid, total, &mut allocations),
            DistributionStrategy::ProportionalSpend => {
                let weights: Vec<f64> = valid.iter().map(|&i| demands[i].current_budget).collect();
                weighted_split(&valid, &weights, total, &mut allocations);
            }
            DistributionStrategy::ProportionalKpi => {
                let weights: Vec<f64> = valid.iter().map(|&i| demands[i].kpi_value).collect();
                if weights.iter().sum::<f64>() > 0.0 {
                    weighted_split(&valid, &weights, total, &mut allocations);
                } else {
                    tracing::debug!("KPI weights sum to zero; falling back to equal split");
                    equal_split(&valid, total, &mut allocations);
                }
            }
        }

        allocations
    }
}

fn equal_split(valid: &[usize], total: f64, allocations: &mut [f64]) {
    let share = total / valid.len() as f64;
    for &i in valid {
        allocations[i] = share;
    }
}

fn weighted_split(valid: &[usize], weights: &[f64], total: f64, allocations: &mut [f64]) {
    let sum: f64 = weights.iter().sum();
    if sum <= 0.0 {
        return;
    }
    for (&i, &weight) in valid.iter().zip(weights) {
        allocations[i] = total * (weight / sum);
    }
}
