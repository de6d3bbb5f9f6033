//! Budget policy configuration.
//!
//! [`PolicySettings`] is the flat form a user writes in a configuration file:
//! every field is present regardless of which mode is selected. It is validated
//! once at the boundary into [`BudgetPolicy`], a tagged union in which each mode
//! carries only the parameters it uses. Business logic only ever sees
//! [`BudgetPolicy`].

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Smallest accepted value for `step_value` and `max_change_per_campaign`.
pub const MIN_STEP_VALUE: f64 = 0.01;

// ---------------------------------------------------------------------------
// Option enums
// ---------------------------------------------------------------------------

/// Whether budgets are raised or lowered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Add the change to the current budget.
    #[default]
    Increase,
    /// Subtract the change, never going below zero.
    Decrease,
}

/// How the change amount is bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CapMode {
    /// Each budget changes individually, capped per campaign.
    #[default]
    PerCampaign,
    /// A total amount is distributed across all budgets.
    TotalBudget,
}

/// Interpretation of `step_value` in per-campaign mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepMode {
    /// A fixed currency amount.
    Absolute,
    /// A percentage of the current budget (`150` means +150%).
    #[default]
    Percentage,
}

/// How a total amount is split in total-budget mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistributionStrategy {
    /// Same share for every budget with a positive current amount.
    #[default]
    Equal,
    /// Share weighted by current budget.
    ProportionalSpend,
    /// Share weighted by the input KPI column.
    ProportionalKpi,
}

/// Whether a run only annotates changes or submits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionMode {
    /// Annotate the proposed changes without any remote mutation.
    #[default]
    Preview,
    /// Submit one mutation per increased or decreased budget.
    Apply,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Preview => write!(f, "PREVIEW"),
            ExecutionMode::Apply => write!(f, "APPLY"),
        }
    }
}

// ---------------------------------------------------------------------------
// Validated policy
// ---------------------------------------------------------------------------

/// Per-campaign step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Step {
    /// Change every budget by this currency amount.
    Absolute(f64),
    /// Change every budget by this percentage of its current amount.
    Percentage(f64),
}

/// The cap mode together with the parameters it needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CapPolicy {
    /// Each budget moves by its own step, bounded per campaign.
    PerCampaign {
        /// Amount or percentage applied to each budget.
        step: Step,
        /// Upper bound on any single budget change (currency units).
        max_change_per_campaign: f64,
    },
    /// One total amount is split across the distinct budgets.
    TotalBudget {
        /// Amount distributed across all budgets (currency units).
        total: f64,
        /// How `total` is divided.
        strategy: DistributionStrategy,
    },
}

/// A validated budget policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetPolicy {
    /// Whether budgets go up or down.
    pub direction: Direction,
    /// How large each change may be.
    pub cap: CapPolicy,
    /// Preview or apply.
    pub execution_mode: ExecutionMode,
}

impl BudgetPolicy {
    /// Returns `true` if the distribution weights come from the KPI column.
    pub fn uses_kpi(&self) -> bool {
        matches!(
            self.cap,
            CapPolicy::TotalBudget {
                strategy: DistributionStrategy::ProportionalKpi,
                ..
            }
        )
    }
}

// ---------------------------------------------------------------------------
// Flat settings
// ---------------------------------------------------------------------------

/// User-facing policy settings, one field per configuration option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySettings {
    pub direction: Direction,
    pub cap_mode: CapMode,
    pub step_mode: StepMode,
    /// Absolute amount, percentage, or total budget depending on the modes.
    pub step_value: f64,
    pub max_change_per_campaign: f64,
    pub distribution_strategy: DistributionStrategy,
    pub execution_mode: ExecutionMode,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            direction: Direction::Increase,
            cap_mode: CapMode::PerCampaign,
            step_mode: StepMode::Percentage,
            step_value: 10.0,
            max_change_per_campaign: 100.0,
            distribution_strategy: DistributionStrategy::Equal,
            execution_mode: ExecutionMode::Preview,
        }
    }
}

impl PolicySettings {
    /// Validates the settings and folds them into a [`BudgetPolicy`].
    ///
    /// Settings that do not apply to the selected cap mode are ignored and not
    /// range-checked.
    pub fn validate(&self) -> Result<BudgetPolicy, ConfigError> {
        let step_value = at_least("step_value", self.step_value, MIN_STEP_VALUE)?;

        let cap = match self.cap_mode {
            CapMode::PerCampaign => {
                let max_change_per_campaign = at_least(
                    "max_change_per_campaign",
                    self.max_change_per_campaign,
                    MIN_STEP_VALUE,
                )?;
                let step = match self.step_mode {
                    StepMode::Absolute => Step::Absolute(step_value),
                    StepMode::Percentage => Step::Percentage(step_value),
                };
                CapPolicy::PerCampaign {
                    step,
                    max_change_per_campaign,
                }
            }
            CapMode::TotalBudget => CapPolicy::TotalBudget {
                total: step_value,
                strategy: self.distribution_strategy,
            },
        };

        Ok(BudgetPolicy {
            direction: self.direction,
            cap,
            execution_mode: self.execution_mode,
        })
    }
}

fn at_least(field: &'static str, value: f64, min: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= min {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange { field, value, min })
    }
}
