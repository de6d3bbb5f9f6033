//! Two-phase execution of change records: preview or apply.
//!
//! Both phases move every record from its initial status to exactly one
//! terminal [`Status`], updating only `status` and `message`.
//!
//! | Action | Preview | Apply |
//! |--------|---------|-------|
//! | INCREASE / DECREASE | `PREVIEW` | `SUCCESS` or `FAILED` |
//! | SHARED_REF | `PREVIEW_SHARED` | `SHARED_APPLIED` |
//! | SKIPPED | `SKIPPED` | `SKIPPED` |
//! | NO_CHANGE | `NO_ACTION` | `NO_ACTION` |

use pipeline::{
    Action, AdsService, BudgetError, BudgetUpdate, ChangeRecord, CustomerId, ProgressReporter,
    ResourceKind, Status, PREVIEW_PREFIX, SEGMENT_SEPARATOR,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Progress fraction at which the apply phase starts.
const APPLY_PROGRESS_START: f64 = 0.5;
/// Share of total progress covered by the apply phase.
const APPLY_PROGRESS_SPAN: f64 = 0.4;

const APPLIED_MARKER: &str = "✅ Applied successfully";

/// Annotates every record as a dry run. No remote calls are made.
pub fn preview(changes: &mut [ChangeRecord]) {
    for change in changes.iter_mut() {
        match change.action {
            Action::Increase | Action::Decrease => {
                change.status = Status::Preview;
                change.message = format!("{PREVIEW_PREFIX}{}", change.message);
            }
            Action::SharedRef => {
                change.status = Status::PreviewShared;
                change.message = format!("{PREVIEW_PREFIX}{}", change.message);
            }
            Action::Skipped => change.status = Status::Skipped,
            Action::NoChange => change.status = Status::NoAction,
        }
    }
}

/// Counts from one apply pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApplySummary {
    /// Records with a mutation action.
    pub actionable: usize,
    /// Mutations the remote API accepted.
    pub succeeded: usize,
    /// Mutations rejected without aborting the run.
    pub failed: usize,
}

/// Submits the mutation of every primary change record, one call at a time.
pub struct ApplyExecutor<'a> {
    ads: &'a dyn AdsService,
    customer_id: &'a CustomerId,
    progress: &'a dyn ProgressReporter,
    cancel: &'a CancellationToken,
}

impl<'a> ApplyExecutor<'a> {
    /// Creates an executor for one run.
    pub fn new(
        ads: &'a dyn AdsService,
        customer_id: &'a CustomerId,
        progress: &'a dyn ProgressReporter,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            ads,
            customer_id,
            progress,
            cancel,
        }
    }

    /// Applies the records in order.
    ///
    /// A rejected mutation marks its record `FAILED` and processing continues.
    /// Mutations already submitted are not rolled back when an error aborts
    /// the pass.
    ///
    /// # Errors
    ///
    /// - [`BudgetError::WrongColumn`] if the service reports a malformed budget
    ///   resource name.
    /// - [`BudgetError::Cancelled`] if cancellation is requested between records.
    #[instrument(skip_all, fields(customer = %self.customer_id.masked(), records = changes.len()))]
    pub async fn apply(&self, changes: &mut [ChangeRecord]) -> Result<ApplySummary, BudgetError> {
        let mut summary = ApplySummary {
            actionable: changes.iter().filter(|c| c.action.is_mutation()).count(),
            ..ApplySummary::default()
        };

        for change in changes.iter_mut() {
            if self.cancel.is_cancelled() {
                return Err(BudgetError::Cancelled);
            }

            match change.action {
                Action::Increase | Action::Decrease => {}
                Action::Skipped => {
                    change.status = Status::Skipped;
                    continue;
                }
                // The primary record's mutation already covers this budget.
                Action::SharedRef => {
                    change.status = Status::SharedApplied;
                    continue;
                }
                Action::NoChange => {
                    change.status = Status::NoAction;
                    continue;
                }
            }

            let update = BudgetUpdate {
                resource_name: change.budget_resource_name.clone(),
                amount_micros: change.proposed_micros(),
            };

            match self.ads.mutate_campaign_budget(self.customer_id, &update).await {
                Ok(_) => {
                    change.status = Status::Success;
                    append_segment(&mut change.message, APPLIED_MARKER);
                    summary.succeeded += 1;
                    info!(
                        budget = %update.resource_name,
                        amount_micros = update.amount_micros.as_i64(),
                        "Budget updated"
                    );

                    self.progress.set_progress(
                        apply_fraction(summary.succeeded, summary.actionable),
                        &format!("Applied {}/{} changes", summary.succeeded, summary.actionable),
                    );
                }
                Err(err) if err.is_malformed_resource_name() => {
                    return Err(BudgetError::wrong_column(
                        ResourceKind::CampaignBudget,
                        change.budget_resource_name.as_str(),
                    ));
                }
                Err(err) => {
                    warn!(budget = %update.resource_name, error = %err, "Budget update failed");
                    change.status = Status::Failed;
                    append_segment(&mut change.message, &format!("❌ API Error: {}", err.message));
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}

/// Progress after `succeeded` of `actionable` mutations; `0.9` once all are in.
fn apply_fraction(succeeded: usize, actionable: usize) -> f64 {
    let done = succeeded as f64 / actionable.max(1) as f64;
    (APPLY_PROGRESS_START + APPLY_PROGRESS_SPAN * done)
        .min(APPLY_PROGRESS_START + APPLY_PROGRESS_SPAN)
}

fn append_segment(message: &mut String, segment: &str) {
    message.push_str(SEGMENT_SEPARATOR);
    message.push_str(segment);
}
