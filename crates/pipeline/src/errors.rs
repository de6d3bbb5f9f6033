//! Run-level error types for the budget domain.
//!
//! [`BudgetError`] covers conditions that abort a run: no partial output is
//! produced when one is returned. Row-local failures (a single mutation
//! rejected by the remote service) never become a [`BudgetError`]; they are
//! absorbed into the affected [`crate::ChangeRecord`] instead.
//!
//! [`ApiError`] is the unwrapped, human-readable form of any remote failure.
//! Adapters convert their transport-specific error payloads into it so the
//! rest of the system only ever sees a status and a message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ResourceKind;

// ---------------------------------------------------------------------------
// Remote errors
// ---------------------------------------------------------------------------

/// A remote-service failure reduced to a status and a message.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{status}: {message}")]
pub struct ApiError {
    /// Short status label (e.g. `"INVALID_ARGUMENT"`, `"HTTP 503"`).
    pub status: String,
    /// The most specific human-readable message available.
    pub message: String,
}

impl ApiError {
    /// Creates a new [`ApiError`].
    pub fn new(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if the remote service rejected a resource name as malformed.
    ///
    /// This is the single classification point for the fail-fast rule: a
    /// malformed resource name means the wrong input column was selected.
    pub fn is_malformed_resource_name(&self) -> bool {
        self.message.to_lowercase().contains("malformed")
    }
}

// ---------------------------------------------------------------------------
// Run-level errors
// ---------------------------------------------------------------------------

/// Errors that abort a budget-updater run.
#[derive(Debug, Error)]
pub enum BudgetError {
    /// A value in the input table is not a resource name of the expected kind.
    ///
    /// Produced by: campaign format check in the calculator, and by the fetcher
    /// or executor when the remote service reports a malformed resource name.
    #[error(
        "Wrong column selected for {}.\n\n\
         The value '{value}' is not a valid {} resource name.\n\n\
         Expected format: '{}'\n\
         Example: '{}'",
        .kind.label(),
        .kind.noun(),
        .kind.expected_format(),
        .kind.example()
    )]
    WrongColumn {
        /// Which kind of resource the column was supposed to hold.
        kind: ResourceKind,
        /// The offending value.
        value: String,
    },

    /// A mapped column does not exist in the input table.
    #[error("The {purpose} column '{column}' is missing in the input table.")]
    MissingColumn {
        /// What the column is used for (e.g. `"campaign resource name"`).
        purpose: String,
        /// The configured column name.
        column: String,
    },

    /// The policy or column configuration is invalid.
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// The run was cancelled cooperatively.
    ///
    /// Mutations applied before cancellation are not rolled back.
    #[error("Execution cancelled")]
    Cancelled,

    /// A remote failure that is fatal at its call site.
    #[error("Remote API error: {0}")]
    Api(#[from] ApiError),
}

impl BudgetError {
    /// Shorthand for a [`BudgetError::WrongColumn`] error.
    pub fn wrong_column(kind: ResourceKind, value: impl Into<String>) -> Self {
        Self::WrongColumn {
            kind,
            value: value.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Invalid settings detected at the configuration boundary.
///
/// Produced at load time; a run never starts with an invalid configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A numeric setting is below its minimum or not finite.
    #[error("'{field}' must be a finite number of at least {min}, got {value}")]
    OutOfRange {
        /// The setting name.
        field: &'static str,
        /// The rejected value.
        value: f64,
        /// The inclusive lower bound.
        min: f64,
    },

    /// A required column selection is empty.
    #[error("Select a column for '{0}' in the node configuration.")]
    ColumnNotSelected(&'static str),
}
