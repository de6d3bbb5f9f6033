//! Newtype domain identifiers.
//!
//! Every remote resource the budget engine touches is represented as a distinct
//! newtype wrapping a string. This prevents accidentally passing a campaign
//! resource name where a budget resource name is expected even though both are
//! `String` under the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Remote resource kinds
// ---------------------------------------------------------------------------

/// The kinds of remote resource a column of the input table can identify.
///
/// Used to render actionable "wrong column selected" errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// A `campaign` resource.
    Campaign,
    /// A `campaign_budget` resource.
    CampaignBudget,
}

impl ResourceKind {
    /// Human-readable label used in column-selection errors.
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Campaign => "Campaign Resource Name",
            ResourceKind::CampaignBudget => "Budget Resource Name",
        }
    }

    /// Lower-case noun used inside sentences.
    pub fn noun(self) -> &'static str {
        match self {
            ResourceKind::Campaign => "campaign",
            ResourceKind::CampaignBudget => "budget",
        }
    }

    /// Description of the expected path shape.
    pub fn expected_format(self) -> &'static str {
        match self {
            ResourceKind::Campaign => "customers/{customer_id}/campaigns/{campaign_id}",
            ResourceKind::CampaignBudget => "customers/{customer_id}/campaignBudgets/{budget_id}",
        }
    }

    /// A well-formed example value.
    pub fn example(self) -> &'static str {
        match self {
            ResourceKind::Campaign => "customers/1234567890/campaigns/9876543210",
            ResourceKind::CampaignBudget => "customers/1234567890/campaignBudgets/5555555555",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Campaign => write!(f, "campaign"),
            ResourceKind::CampaignBudget => write!(f, "campaign_budget"),
        }
    }
}

// ---------------------------------------------------------------------------
// Identifiers — resource names
// ---------------------------------------------------------------------------

/// Resource name of a campaign (`customers/{customer_id}/campaigns/{campaign_id}`).
///
/// Input rows may carry an empty campaign value; it is kept as-is and not
/// format-checked, so this type does not reject the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CampaignResourceName(String);

impl CampaignResourceName {
    /// Wraps a raw value without validation.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns `true` when the value has the campaign path shape.
    ///
    /// Empty values are considered acceptable; they are never sent anywhere.
    pub fn is_well_formed(&self) -> bool {
        self.0.is_empty() || (self.0.starts_with("customers/") && self.0.contains("/campaigns/"))
    }

    /// Returns the resource name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CampaignResourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resource name of a campaign budget
/// (`customers/{customer_id}/campaignBudgets/{budget_id}`).
///
/// The shape is validated by the remote service, not locally: a malformed
/// value surfaces as a fatal error on the first lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BudgetResourceName(String);

impl BudgetResourceName {
    /// Wraps a raw value without validation.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the resource name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BudgetResourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers — account
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies the advertiser account that owns the campaigns.
    ///
    /// Construct with [`CustomerId::parse`] to strip the dashes users paste from
    /// the web UI (`123-456-7890` → `1234567890`).
    CustomerId
}

impl CustomerId {
    /// Cleans a user-supplied account id and wraps it.
    ///
    /// Returns `None` if nothing remains after cleaning.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::new(raw.replace('-', "").trim().to_string())
    }

    /// Returns the id with everything except the last four characters hidden.
    pub fn masked(&self) -> String {
        mask(self.as_str())
    }
}

/// Masks an account id for log output.
pub fn mask(raw: &str) -> String {
    if raw.is_empty() {
        return "<empty>".to_string();
    }
    let chars: Vec<char> = raw.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

// ---------------------------------------------------------------------------
// Identifiers — UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single budget-updater execution.
///
/// Generated fresh for every run; recorded on the run span so all remote calls
/// from a single run can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a [`RunId`] from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
