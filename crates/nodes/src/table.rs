//! The input table and the column mapping that turns it into [`CampaignRow`]s.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use pipeline::{BudgetError, BudgetPolicy, CampaignRow, ConfigError};

/// Which input columns hold the campaign, the budget, and the KPI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub campaign_column: String,
    pub budget_column: String,
    /// Only read when the policy distributes by KPI.
    pub kpi_column: Option<String>,
}

impl ColumnMapping {
    /// Checks that every column the policy needs has been selected.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ColumnNotSelected`] naming the first missing
    /// selection.
    pub fn validate(&self, policy: &BudgetPolicy) -> Result<(), ConfigError> {
        if self.campaign_column.trim().is_empty() {
            return Err(ConfigError::ColumnNotSelected("Campaign Resource Name Column"));
        }
        if self.budget_column.trim().is_empty() {
            return Err(ConfigError::ColumnNotSelected("Budget Resource Name Column"));
        }
        if policy.uses_kpi() && self.kpi_column().is_none() {
            return Err(ConfigError::ColumnNotSelected("KPI Column"));
        }
        Ok(())
    }

    fn kpi_column(&self) -> Option<&str> {
        self.kpi_column
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// A table of rows keyed by column name.
///
/// Serialized as a JSON array of objects. A column exists if any row carries
/// it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputTable {
    rows: Vec<Map<String, Value>>,
}

impl InputTable {
    /// Wraps rows already keyed by column name.
    pub fn new(rows: Vec<Map<String, Value>>) -> Self {
        Self { rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns `true` if any row has a value under `column`.
    pub fn has_column(&self, column: &str) -> bool {
        self.rows.iter().any(|row| row.contains_key(column))
    }

    /// Extracts one [`CampaignRow`] per table row, in table order.
    ///
    /// The KPI column is only read when `policy` distributes by KPI. Numbers
    /// and numeric strings are accepted as KPI values; anything else counts as
    /// absent.
    ///
    /// # Errors
    ///
    /// - [`BudgetError::MissingColumn`] if a mapped column is absent from a
    ///   non-empty table.
    /// - [`BudgetError::Cancelled`] if cancellation is requested mid-table.
    pub fn campaign_rows(
        &self,
        mapping: &ColumnMapping,
        policy: &BudgetPolicy,
        cancel: &CancellationToken,
    ) -> Result<Vec<CampaignRow>, BudgetError> {
        if self.rows.is_empty() {
            return Ok(Vec::new());
        }

        self.require_column("campaign resource name", &mapping.campaign_column)?;
        self.require_column("budget resource name", &mapping.budget_column)?;
        let kpi_column = match mapping.kpi_column().filter(|_| policy.uses_kpi()) {
            Some(column) => {
                self.require_column("KPI", column)?;
                Some(column)
            }
            None => None,
        };

        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            if cancel.is_cancelled() {
                return Err(BudgetError::Cancelled);
            }
            rows.push(CampaignRow::new(
                text_value(row.get(&mapping.campaign_column)),
                text_value(row.get(&mapping.budget_column)),
                kpi_column.and_then(|column| kpi_value(row.get(column))),
            ));
        }
        Ok(rows)
    }

    fn require_column(&self, purpose: &str, column: &str) -> Result<(), BudgetError> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(BudgetError::MissingColumn {
                purpose: purpose.to_string(),
                column: column.to_string(),
            })
        }
    }
}

fn text_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn kpi_value(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}
