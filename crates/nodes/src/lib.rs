//! Budget updater node.
//!
//! This crate turns an input table into budget changes: it extracts campaign
//! rows, fetches current budgets through the [`pipeline::AdsService`] port,
//! runs the change calculator, and then either previews or applies the result.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The node sequences calls between business logic in
//! the [`pipeline`] crate and the remote-service port. It contains no budget
//! rules of its own.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`table`] | `InputTable` and `ColumnMapping` |
//! | [`fetcher`] | `BudgetFetcher` |
//! | [`executor`] | `preview` and `ApplyExecutor` |
//! | [`updater`] | `BudgetUpdater`, the run driver |
//! | [`audit`] | `RunReport` and flat `AuditRow`s |
//! | [`progress`] | `TracingProgress` |
//!
//! ## Cancellation
//!
//! Every remote-calling step polls a
//! [`CancellationToken`](tokio_util::sync::CancellationToken) before each call.
//! A cancelled run returns [`pipeline::BudgetError::Cancelled`].

pub mod audit;
pub mod executor;
pub mod fetcher;
pub mod progress;
pub mod table;
pub mod updater;

pub use audit::{AuditRow, RunReport};
pub use executor::{preview, ApplyExecutor, ApplySummary};
pub use fetcher::{distinct_budgets, BudgetFetcher};
pub use progress::TracingProgress;
pub use table::{ColumnMapping, InputTable};
pub use updater::BudgetUpdater;
