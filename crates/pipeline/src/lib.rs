//! Budget reallocation domain.
//!
//! This crate contains the domain concepts, newtype identifiers, policy
//! configuration, and the pure budget-change engine: distribution strategies,
//! the change calculator with shared-budget deduplication, and the message
//! builder. Infrastructure crates implement the port traits defined here; they
//! never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`CustomerId`, `BudgetResourceName`, etc.) |
//! | [`types`] | Value types (`Micros`, `Timestamp`) and cent rounding |
//! | [`errors`] | Run-level, remote, and configuration errors |
//! | [`policy`] | Flat settings and the validated `BudgetPolicy` |
//! | [`records`] | `CampaignRow`, `BudgetSnapshot`, `ChangeRecord` |
//! | [`distribution`] | Per-campaign and total-budget allocation |
//! | [`calculator`] | Change calculation with shared-budget handling |
//! | [`message`] | Change descriptions |
//! | [`queries`] | Budget lookup query text |
//! | [`ports`] | `AdsService` and `ProgressReporter` traits |

pub mod calculator;
pub mod distribution;
pub mod errors;
pub mod identifiers;
pub mod message;
pub mod policy;
pub mod ports;
pub mod queries;
pub mod records;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use calculator::{calculate_changes, BUDGET_NOT_FOUND_REASON};
pub use distribution::{allocate, BudgetDemand};
pub use errors::{ApiError, BudgetError, ConfigError};
pub use identifiers::{
    mask, BudgetResourceName, CampaignResourceName, CustomerId, ResourceKind, RunId,
};
pub use message::{build_message, MessageParts, PREVIEW_PREFIX, SEGMENT_SEPARATOR};
pub use policy::{
    BudgetPolicy, CapMode, CapPolicy, Direction, DistributionStrategy, ExecutionMode,
    PolicySettings, Step, StepMode,
};
pub use ports::{AdsService, BudgetRow, BudgetUpdate, NoProgress, ProgressReporter};
pub use queries::budget_lookup_query;
pub use records::{Action, BudgetSnapshot, CampaignRow, ChangeRecord, Status};
pub use types::{round_cents, Micros, Timestamp, MICROS_PER_CENT, MICROS_PER_UNIT};
