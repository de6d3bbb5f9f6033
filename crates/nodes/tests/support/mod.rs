//! In-memory `AdsService` for node tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use pipeline::{
    AdsService, ApiError, BudgetResourceName, BudgetRow, BudgetUpdate, CampaignResourceName,
    CustomerId, Micros, ProgressReporter,
};
use serde_json::{json, Value};

pub const CUSTOMER: &str = "123-456-7890";

pub fn budget(id: u32) -> String {
    format!("customers/1234567890/campaignBudgets/{id}")
}

pub fn campaign(id: u32) -> String {
    format!("customers/1234567890/campaigns/{id}")
}

pub fn customer() -> CustomerId {
    CustomerId::parse(CUSTOMER).expect("valid customer id")
}

/// Builds an input table from `(campaign, budget, kpi)` triples.
pub fn table(rows: &[(String, String, Option<f64>)]) -> nodes::InputTable {
    let rows: Vec<Value> = rows
        .iter()
        .map(|(c, b, k)| json!({ "campaign": c, "budget": b, "kpi": k }))
        .collect();
    serde_json::from_value(Value::Array(rows)).expect("valid table")
}

pub fn columns() -> nodes::ColumnMapping {
    nodes::ColumnMapping {
        campaign_column: "campaign".to_string(),
        budget_column: "budget".to_string(),
        kpi_column: Some("kpi".to_string()),
    }
}

#[derive(Default)]
pub struct FakeAds {
    budgets: HashMap<String, (i64, String)>,
    search_errors: HashMap<String, String>,
    mutate_errors: HashMap<String, String>,
    pub searches: Mutex<Vec<String>>,
    pub mutations: Mutex<Vec<BudgetUpdate>>,
}

impl FakeAds {
    pub fn with_budget(mut self, budget: &str, amount: f64, campaign_name: &str) -> Self {
        self.budgets.insert(
            budget.to_string(),
            (Micros::from_amount(amount).as_i64(), campaign_name.to_string()),
        );
        self
    }

    pub fn failing_search(mut self, budget: &str, message: &str) -> Self {
        self.search_errors.insert(budget.to_string(), message.to_string());
        self
    }

    pub fn failing_mutation(mut self, budget: &str, message: &str) -> Self {
        self.mutate_errors.insert(budget.to_string(), message.to_string());
        self
    }

    pub fn mutations(&self) -> Vec<BudgetUpdate> {
        self.mutations.lock().expect("lock").clone()
    }

    pub fn search_count(&self) -> usize {
        self.searches.lock().expect("lock").len()
    }

    fn budget_in(query: &str) -> &str {
        query
            .rsplit_once("= '")
            .map(|(_, tail)| tail.trim_end_matches('\''))
            .unwrap_or_default()
    }
}

#[async_trait]
impl AdsService for FakeAds {
    async fn search_budgets(
        &self,
        _customer_id: &CustomerId,
        query: &str,
    ) -> Result<Vec<BudgetRow>, ApiError> {
        self.searches.lock().expect("lock").push(query.to_string());
        let budget = Self::budget_in(query);
        if let Some(message) = self.search_errors.get(budget) {
            return Err(ApiError::new("INVALID_ARGUMENT", message.clone()));
        }
        Ok(self
            .budgets
            .get(budget)
            .map(|(micros, name)| BudgetRow {
                budget_resource_name: BudgetResourceName::new(budget),
                amount_micros: Micros::new(*micros),
                budget_name: format!("{name} budget"),
                campaign_resource_name: CampaignResourceName::new(""),
                campaign_name: name.clone(),
            })
            .into_iter()
            .collect())
    }

    async fn mutate_campaign_budget(
        &self,
        _customer_id: &CustomerId,
        update: &BudgetUpdate,
    ) -> Result<BudgetResourceName, ApiError> {
        if let Some(message) = self.mutate_errors.get(update.resource_name.as_str()) {
            return Err(ApiError::new("INVALID_ARGUMENT", message.clone()));
        }
        self.mutations.lock().expect("lock").push(update.clone());
        Ok(update.resource_name.clone())
    }
}

/// Records every progress update.
#[derive(Default)]
pub struct RecordingProgress {
    pub updates: Mutex<Vec<(f64, String)>>,
}

impl ProgressReporter for RecordingProgress {
    fn set_progress(&self, fraction: f64, message: &str) {
        self.updates
            .lock()
            .expect("lock")
            .push((fraction, message.to_string()));
    }
}
