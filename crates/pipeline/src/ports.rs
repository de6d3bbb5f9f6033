//! Port traits implemented by infrastructure crates.
//!
//! - [`AdsService`]: the remote advertising API, with a `search`-style query over
//!   `campaign_budget` and a `mutate`-style update of a budget amount.
//! - [`ProgressReporter`]: where the orchestration layer reports progress.
//!
//! Rows returned by [`AdsService::search_budgets`] are fully typed
//! ([`BudgetRow`]); adapters map wire fields explicitly instead of walking
//! dotted field paths at runtime.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    ApiError, BudgetResourceName, BudgetSnapshot, CampaignResourceName, CustomerId, Micros,
};

// ---------------------------------------------------------------------------
// Remote data shapes
// ---------------------------------------------------------------------------

/// One result row of a budget lookup query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetRow {
    pub budget_resource_name: BudgetResourceName,
    pub amount_micros: Micros,
    pub budget_name: String,
    pub campaign_resource_name: CampaignResourceName,
    pub campaign_name: String,
}

impl BudgetRow {
    /// Converts the row into the snapshot the calculator consumes.
    pub fn into_snapshot(self) -> BudgetSnapshot {
        BudgetSnapshot {
            amount: self.amount_micros.as_amount(),
            resource_name: self.budget_resource_name,
            amount_micros: self.amount_micros,
            budget_name: self.budget_name,
            campaign_name: self.campaign_name,
            campaign_resource_name: self.campaign_resource_name,
        }
    }
}

/// An update of a single budget's amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetUpdate {
    pub resource_name: BudgetResourceName,
    pub amount_micros: Micros,
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// The remote advertising API, as seen by the budget engine.
///
/// Implementations are expected to be authenticated already; credential
/// lifecycle is handled outside this trait.
#[async_trait]
pub trait AdsService: Send + Sync {
    /// Runs a budget lookup query and returns the typed result rows.
    async fn search_budgets(
        &self,
        customer_id: &CustomerId,
        query: &str,
    ) -> Result<Vec<BudgetRow>, ApiError>;

    /// Submits one budget amount update.
    ///
    /// Returns the resource name of the updated budget.
    async fn mutate_campaign_budget(
        &self,
        customer_id: &CustomerId,
        update: &BudgetUpdate,
    ) -> Result<BudgetResourceName, ApiError>;
}

/// Receives progress updates for a run.
pub trait ProgressReporter: Send + Sync {
    /// `fraction` is in `[0.0, 1.0]`.
    fn set_progress(&self, fraction: f64, message: &str);
}

/// A [`ProgressReporter`] that discards updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn set_progress(&self, _fraction: f64, _message: &str) {}
}
