//! Budget fetching: budget resource names → current [`BudgetSnapshot`]s.

use std::collections::{HashMap, HashSet};

use pipeline::{
    budget_lookup_query, AdsService, BudgetError, BudgetResourceName, BudgetSnapshot,
    CampaignRow, CustomerId, ResourceKind,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// Returns the distinct budget resources referenced by `rows`, in order of
/// first appearance.
pub fn distinct_budgets(rows: &[CampaignRow]) -> Vec<BudgetResourceName> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|row| seen.insert(&row.budget_resource_name))
        .map(|row| row.budget_resource_name.clone())
        .collect()
}

/// Looks up current budget amounts, one remote query per budget resource.
pub struct BudgetFetcher<'a> {
    ads: &'a dyn AdsService,
    customer_id: &'a CustomerId,
    cancel: &'a CancellationToken,
}

impl<'a> BudgetFetcher<'a> {
    /// Creates a fetcher that looks budgets up under `customer_id`.
    pub fn new(
        ads: &'a dyn AdsService,
        customer_id: &'a CustomerId,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            ads,
            customer_id,
            cancel,
        }
    }

    /// Fetches a snapshot for each budget resource.
    ///
    /// Budgets the remote service cannot return are left out of the map; the
    /// calculator treats them as a zero budget and skips the affected rows.
    ///
    /// # Errors
    ///
    /// - [`BudgetError::WrongColumn`] as soon as the service reports a malformed
    ///   resource name. No further lookups are issued.
    /// - [`BudgetError::Cancelled`] if cancellation is requested between lookups.
    #[instrument(skip_all, fields(customer = %self.customer_id.masked(), budgets = budgets.len()))]
    pub async fn fetch(
        &self,
        budgets: &[BudgetResourceName],
    ) -> Result<HashMap<BudgetResourceName, BudgetSnapshot>, BudgetError> {
        let mut snapshots = HashMap::with_capacity(budgets.len());

        for budget in budgets {
            if self.cancel.is_cancelled() {
                return Err(BudgetError::Cancelled);
            }

            let query = budget_lookup_query(budget);
            match self.ads.search_budgets(self.customer_id, &query).await {
                Ok(rows) => {
                    if rows.is_empty() {
                        debug!(budget = %budget, "Budget lookup returned no rows");
                    }
                    for row in rows {
                        snapshots.insert(budget.clone(), row.into_snapshot());
                    }
                }
                Err(err) if err.is_malformed_resource_name() => {
                    return Err(BudgetError::wrong_column(
                        ResourceKind::CampaignBudget,
                        budget.as_str(),
                    ));
                }
                Err(err) => {
                    warn!(budget = %budget, error = %err, "Budget lookup failed; row will be skipped");
                }
            }
        }

        debug!(found = snapshots.len(), "Fetched current budgets");
        Ok(snapshots)
    }
}
