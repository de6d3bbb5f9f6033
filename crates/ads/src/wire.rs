//! JSON shapes of the REST endpoints and their conversion to domain types.
//!
//! 64-bit integers travel as strings in the REST encoding; numbers are also
//! accepted on input.

use serde::{Deserialize, Deserializer, Serialize};

use pipeline::{ApiError, BudgetResourceName, BudgetRow, BudgetUpdate, CampaignResourceName, Micros};

/// Field mask sent with every budget update.
pub const AMOUNT_UPDATE_MASK: &str = "amount_micros";

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchResponse {
    pub results: Vec<SearchRow>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRow {
    pub campaign_budget: CampaignBudgetFields,
    pub campaign: CampaignFields,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignBudgetFields {
    pub resource_name: String,
    #[serde(deserialize_with = "int64")]
    pub amount_micros: i64,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignFields {
    pub resource_name: String,
    pub name: String,
}

impl From<SearchRow> for BudgetRow {
    fn from(row: SearchRow) -> Self {
        BudgetRow {
            budget_resource_name: BudgetResourceName::new(row.campaign_budget.resource_name),
            amount_micros: Micros::new(row.campaign_budget.amount_micros),
            budget_name: row.campaign_budget.name,
            campaign_resource_name: CampaignResourceName::new(row.campaign.resource_name),
            campaign_name: row.campaign.name,
        }
    }
}

// ---------------------------------------------------------------------------
// Mutate
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct MutateRequest<'a> {
    pub operations: Vec<BudgetOperation<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetOperation<'a> {
    pub update: BudgetAmount<'a>,
    pub update_mask: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAmount<'a> {
    pub resource_name: &'a str,
    pub amount_micros: String,
}

impl<'a> MutateRequest<'a> {
    /// A request holding a single amount update.
    pub fn single(update: &'a BudgetUpdate) -> Self {
        Self {
            operations: vec![BudgetOperation {
                update: BudgetAmount {
                    resource_name: update.resource_name.as_str(),
                    amount_micros: update.amount_micros.as_i64().to_string(),
                },
                update_mask: AMOUNT_UPDATE_MASK,
            }],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MutateResponse {
    pub results: Vec<MutateResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MutateResult {
    pub resource_name: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    message: String,
    status: String,
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorDetail {
    errors: Vec<DetailedError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DetailedError {
    message: String,
}

/// Reduces an error response to an [`ApiError`].
///
/// The message is the first detailed error message, else the top-level
/// message, else `fallback` (normally the HTTP status text). The status is the
/// body's status code name, else `HTTP {status}`.
pub fn parse_error(http_status: u16, body: &str, fallback: &str) -> ApiError {
    let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap_or_default();
    let error = envelope.error;

    let detailed = error
        .details
        .iter()
        .flat_map(|d| d.errors.iter())
        .map(|e| e.message.as_str())
        .find(|m| !m.is_empty());
    let message = match detailed {
        Some(m) => m.to_string(),
        None if !error.message.is_empty() => error.message,
        None if !body.trim().is_empty() && !body.trim_start().starts_with('{') => {
            body.trim().to_string()
        }
        None => fallback.to_string(),
    };
    let status = if error.status.is_empty() {
        format!("HTTP {http_status}")
    } else {
        error.status
    };
    ApiError::new(status, message)
}

fn int64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Int64 {
        Text(String),
        Number(i64),
    }

    match Int64::deserialize(deserializer)? {
        Int64::Number(n) => Ok(n),
        Int64::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}
