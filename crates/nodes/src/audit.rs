//! Audit output of a run: one flat row per change record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pipeline::{ChangeRecord, ExecutionMode, RunId, Status};

/// Separator between campaign names in [`AuditRow::shared_with_campaigns`].
const SHARED_NAMES_SEPARATOR: &str = ", ";

/// The persisted form of a [`ChangeRecord`].
///
/// Field order is the column order of the audit table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRow {
    pub campaign_resource_name: String,
    pub campaign_budget_resource_name: String,
    pub campaign_name: String,
    pub current_budget: f64,
    pub proposed_budget: f64,
    pub budget_change: f64,
    pub budget_change_pct: f64,
    pub action: String,
    pub status: String,
    pub message: String,
    /// RFC 3339.
    pub timestamp: String,
    pub is_shared_budget: bool,
    pub shared_with_campaigns: String,
}

impl From<&ChangeRecord> for AuditRow {
    fn from(record: &ChangeRecord) -> Self {
        Self {
            campaign_resource_name: record.campaign_resource_name.as_str().to_string(),
            campaign_budget_resource_name: record.budget_resource_name.as_str().to_string(),
            campaign_name: record.campaign_name.clone(),
            current_budget: record.current_budget,
            proposed_budget: record.proposed_budget,
            budget_change: record.budget_change,
            budget_change_pct: record.budget_change_pct,
            action: record.action.to_string(),
            status: record.status.to_string(),
            message: record.message.clone(),
            timestamp: record.timestamp.to_string(),
            is_shared_budget: record.is_shared_budget,
            shared_with_campaigns: record.shared_with_campaigns.join(SHARED_NAMES_SEPARATOR),
        }
    }
}

/// Everything one run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub execution_mode: ExecutionMode,
    /// One record per input row, in input order.
    pub changes: Vec<ChangeRecord>,
}

impl RunReport {
    /// Flattens the records into audit rows tagged with this run.
    pub fn audit_rows(&self) -> Vec<AuditRow> {
        self.changes.iter().map(AuditRow::from).collect()
    }

    /// Number of records per terminal status.
    pub fn status_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for change in &self.changes {
            *counts.entry(change.status.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Count of records with the given status.
    pub fn count(&self, status: Status) -> usize {
        self.changes.iter().filter(|c| c.status == status).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pipeline::{Action, BudgetResourceName, CampaignResourceName, Timestamp};

    fn shared_record() -> ChangeRecord {
        ChangeRecord {
            campaign_resource_name: CampaignResourceName::new("customers/1/campaigns/2"),
            budget_resource_name: BudgetResourceName::new("customers/1/campaignBudgets/9"),
            campaign_name: "Beta".to_string(),
            current_budget: 50.0,
            proposed_budget: 55.0,
            budget_change: 0.0,
            budget_change_pct: 0.0,
            action: Action::SharedRef,
            status: Status::SharedApplied,
            message: "SHARED BUDGET: Beta".to_string(),
            is_shared_budget: true,
            shared_with_campaigns: vec!["Alpha".to_string(), "Beta".to_string()],
            timestamp: Timestamp::from_utc(
                chrono::Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            ),
        }
    }

    #[test]
    fn audit_row_flattens_record() {
        let row = AuditRow::from(&shared_record());
        assert_eq!(row.action, "SHARED_REF");
        assert_eq!(row.status, "SHARED_APPLIED");
        assert_eq!(row.shared_with_campaigns, "Alpha, Beta");
        assert!(row.timestamp.starts_with("2024-03-01T12:00:00"));
    }

    #[test]
    fn audit_row_serializes_thirteen_columns() {
        let value = serde_json::to_value(AuditRow::from(&shared_record())).unwrap();
        let columns = value.as_object().unwrap();
        assert_eq!(columns.len(), 13);
        assert_eq!(
            columns["campaign_budget_resource_name"],
            "customers/1/campaignBudgets/9"
        );
    }

    #[test]
    fn status_counts_group_by_status() {
        let report = RunReport {
            run_id: RunId::new_random(),
            execution_mode: ExecutionMode::Apply,
            changes: vec![shared_record(), shared_record()],
        };
        assert_eq!(report.status_counts().get("SHARED_APPLIED"), Some(&2));
        assert_eq!(report.count(Status::SharedApplied), 2);
        assert_eq!(report.count(Status::Failed), 0);
    }
}
