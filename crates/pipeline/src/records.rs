//! Records flowing through one budget-updater run.
//!
//! - [`CampaignRow`]: one per input table row.
//! - [`BudgetSnapshot`]: one per distinct budget resource, fetched once and
//!   read-only afterwards.
//! - [`ChangeRecord`]: one per input row, created by the calculator and then
//!   updated in place (status and message only) by the preview/apply executor.

use serde::{Deserialize, Serialize};

use crate::{BudgetResourceName, CampaignResourceName, Micros, Timestamp};

/// Campaign name used when the budget lookup returned nothing.
pub const UNKNOWN_CAMPAIGN_NAME: &str = "Unknown";

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// One input row: the campaign, the budget it draws from, and an optional KPI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignRow {
    pub campaign_resource_name: CampaignResourceName,
    pub budget_resource_name: BudgetResourceName,
    /// Weight for KPI-proportional distribution; `None` counts as zero.
    pub kpi_value: Option<f64>,
}

impl CampaignRow {
    /// Builds a row from raw cell text.
    pub fn new(
        campaign_resource_name: impl Into<String>,
        budget_resource_name: impl Into<String>,
        kpi_value: Option<f64>,
    ) -> Self {
        Self {
            campaign_resource_name: CampaignResourceName::new(campaign_resource_name),
            budget_resource_name: BudgetResourceName::new(budget_resource_name),
            kpi_value,
        }
    }
}

/// Current state of one budget resource as reported by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    pub resource_name: BudgetResourceName,
    pub amount_micros: Micros,
    /// Current amount in currency units.
    pub amount: f64,
    /// The budget's own display name.
    pub budget_name: String,
    /// Name of the campaign returned alongside the budget.
    pub campaign_name: String,
    pub campaign_resource_name: CampaignResourceName,
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// What the calculator decided for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Increase,
    Decrease,
    NoChange,
    /// The current budget could not be determined.
    Skipped,
    /// The budget is shared and an earlier row already owns its update.
    SharedRef,
}

impl Action {
    /// Returns `true` for actions that trigger a remote mutation.
    pub fn is_mutation(self) -> bool {
        matches!(self, Action::Increase | Action::Decrease)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Increase => "INCREASE",
            Action::Decrease => "DECREASE",
            Action::NoChange => "NO_CHANGE",
            Action::Skipped => "SKIPPED",
            Action::SharedRef => "SHARED_REF",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a [`ChangeRecord`] is in the preview/apply lifecycle.
///
/// Every record starts as [`Status::Pending`] or [`Status::Shared`] and makes
/// exactly one transition to a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Pending,
    Preview,
    PreviewShared,
    Skipped,
    Shared,
    SharedApplied,
    Success,
    Failed,
    NoAction,
}

impl Status {
    /// Returns `true` once the executor has processed the record.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Status::Pending | Status::Shared)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "PENDING",
            Status::Preview => "PREVIEW",
            Status::PreviewShared => "PREVIEW_SHARED",
            Status::Skipped => "SKIPPED",
            Status::Shared => "SHARED",
            Status::SharedApplied => "SHARED_APPLIED",
            Status::Success => "SUCCESS",
            Status::Failed => "FAILED",
            Status::NoAction => "NO_ACTION",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The proposed (and, after apply, executed) change for one input row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub campaign_resource_name: CampaignResourceName,
    pub budget_resource_name: BudgetResourceName,
    pub campaign_name: String,
    pub current_budget: f64,
    pub proposed_budget: f64,
    /// Signed: positive for increases, negative for decreases, zero otherwise.
    pub budget_change: f64,
    /// Signed like `budget_change`, in percent of `current_budget`.
    pub budget_change_pct: f64,
    pub action: Action,
    pub status: Status,
    pub message: String,
    pub is_shared_budget: bool,
    /// Names of every campaign on this budget; empty unless shared.
    pub shared_with_campaigns: Vec<String>,
    pub timestamp: Timestamp,
}

impl ChangeRecord {
    /// The amount to submit for this record, in wire units.
    pub fn proposed_micros(&self) -> Micros {
        Micros::from_amount(self.proposed_budget)
    }
}
