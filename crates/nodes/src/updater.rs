//! The budget updater node: one run from input table to [`RunReport`].
//!
//! A run is a straight line:
//!
//! 1. extract campaign rows from the input table;
//! 2. fetch the current amount of every distinct budget;
//! 3. calculate one change record per row;
//! 4. preview or apply, depending on the execution mode.
//!
//! Every step is fatal on error. Row-local mutation failures are recorded in
//! the report instead.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use pipeline::{
    calculate_changes, AdsService, BudgetError, BudgetPolicy, CustomerId, ExecutionMode,
    ProgressReporter, RunId, Timestamp,
};

use crate::{
    distinct_budgets, preview, ApplyExecutor, BudgetFetcher, ColumnMapping, InputTable, RunReport,
};

/// Drives budget-updater runs against one customer account.
pub struct BudgetUpdater {
    ads: Arc<dyn AdsService>,
    customer_id: CustomerId,
    columns: ColumnMapping,
    policy: BudgetPolicy,
}

impl BudgetUpdater {
    /// # Errors
    ///
    /// Returns [`BudgetError::Configuration`] if a column the policy needs has
    /// not been selected.
    pub fn new(
        ads: Arc<dyn AdsService>,
        customer_id: CustomerId,
        columns: ColumnMapping,
        policy: BudgetPolicy,
    ) -> Result<Self, BudgetError> {
        columns.validate(&policy)?;
        Ok(Self {
            ads,
            customer_id,
            columns,
            policy,
        })
    }

    pub fn policy(&self) -> &BudgetPolicy {
        &self.policy
    }

    /// Executes one run over `table`.
    ///
    /// In apply mode, mutations submitted before an error or cancellation stay
    /// applied.
    #[instrument(
        skip_all,
        fields(
            run_id = tracing::field::Empty,
            customer = %self.customer_id.masked(),
            mode = %self.policy.execution_mode,
            rows = table.len(),
        )
    )]
    pub async fn run(
        &self,
        table: &InputTable,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<RunReport, BudgetError> {
        let run_id = RunId::new_random();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));

        let rows = table.campaign_rows(&self.columns, &self.policy, cancel)?;

        progress.set_progress(0.1, "Fetching current budgets...");
        let budgets = distinct_budgets(&rows);
        let snapshots = BudgetFetcher::new(self.ads.as_ref(), &self.customer_id, cancel)
            .fetch(&budgets)
            .await?;

        progress.set_progress(0.3, "Calculating budget changes...");
        let mut changes = calculate_changes(&rows, &snapshots, &self.policy, Timestamp::now())?;

        match self.policy.execution_mode {
            ExecutionMode::Preview => {
                progress.set_progress(0.5, "Generating preview...");
                preview(&mut changes);
            }
            ExecutionMode::Apply => {
                progress.set_progress(0.5, "Applying budget changes...");
                let summary =
                    ApplyExecutor::new(self.ads.as_ref(), &self.customer_id, progress, cancel)
                        .apply(&mut changes)
                        .await?;
                info!(
                    actionable = summary.actionable,
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    "Apply finished"
                );
            }
        }

        progress.set_progress(0.9, "Building audit log...");
        let report = RunReport {
            run_id,
            execution_mode: self.policy.execution_mode,
            changes,
        };
        info!(counts = ?report.status_counts(), "Run complete");

        progress.set_progress(1.0, "Complete");
        Ok(report)
    }
}
