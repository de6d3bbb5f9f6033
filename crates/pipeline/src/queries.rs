//! Query text sent through [`crate::AdsService::search_budgets`].

use crate::BudgetResourceName;

/// Builds the lookup query for one budget resource.
///
/// Single quotes in the value are escaped so a malformed identifier reaches the
/// remote service intact and is reported as malformed rather than as a syntax
/// error.
pub fn budget_lookup_query(budget: &BudgetResourceName) -> String {
    let value = budget.as_str().replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "SELECT campaign_budget.resource_name, campaign_budget.amount_micros, \
         campaign_budget.name, campaign.resource_name, campaign.name \
         FROM campaign_budget \
         WHERE campaign_budget.resource_name = '{value}'"
    )
}
