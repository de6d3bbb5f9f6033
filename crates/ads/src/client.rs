//! Authenticated HTTP client for the advertising REST API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use pipeline::{
    AdsService, ApiError, BudgetResourceName, BudgetRow, BudgetUpdate, CustomerId,
};

use crate::wire::{parse_error, MutateRequest, MutateResponse, SearchRequest, SearchResponse};

pub const DEFAULT_BASE_URL: &str = "https://googleads.googleapis.com";
pub const DEFAULT_API_VERSION: &str = "v17";

/// Failure to construct a [`RestAdsClient`].
#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("HTTP client could not be created: {0}")]
    Http(#[from] reqwest::Error),

    #[error("credential '{0}' is empty")]
    EmptyCredential(&'static str),
}

/// Connection settings for [`RestAdsClient`].
#[derive(Clone)]
pub struct AdsConnection {
    pub base_url: String,
    pub api_version: String,
    pub developer_token: String,
    /// OAuth access token, sent as a bearer token.
    pub access_token: String,
    /// Manager account to act through, if any.
    pub login_customer_id: Option<CustomerId>,
}

impl AdsConnection {
    /// Connection settings for the public endpoint with no login customer.
    pub fn new(developer_token: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            developer_token: developer_token.into(),
            access_token: access_token.into(),
            login_customer_id: None,
        }
    }
}

impl std::fmt::Debug for AdsConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdsConnection")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("developer_token", &"[REDACTED]")
            .field("access_token", &"[REDACTED]")
            .field(
                "login_customer_id",
                &self.login_customer_id.as_ref().map(CustomerId::masked),
            )
            .finish()
    }
}

/// [`AdsService`] over the REST encoding of the API.
pub struct RestAdsClient {
    http: Client,
    connection: AdsConnection,
}

impl RestAdsClient {
    /// Creates a client for `connection`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError::EmptyCredential`] if a token is blank, or
    /// the underlying error if the HTTP client cannot be built.
    pub fn new(connection: AdsConnection) -> Result<Self, ClientBuildError> {
        if connection.developer_token.trim().is_empty() {
            return Err(ClientBuildError::EmptyCredential("developer_token"));
        }
        if connection.access_token.trim().is_empty() {
            return Err(ClientBuildError::EmptyCredential("access_token"));
        }
        let http = Client::builder().build()?;
        Ok(Self { http, connection })
    }

    fn endpoint(&self, customer_id: &CustomerId, method: &str) -> String {
        format!(
            "{}/{}/customers/{}/{}",
            self.connection.base_url.trim_end_matches('/'),
            self.connection.api_version,
            customer_id.as_str(),
            method
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request
            .bearer_auth(&self.connection.access_token)
            .header("developer-token", &self.connection.developer_token);
        match &self.connection.login_customer_id {
            Some(login) => request.header("login-customer-id", login.as_str()),
            None => request,
        }
    }

    async fn post<Req, Res>(&self, url: &str, body: &Req) -> Result<Res, ApiError>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let response = self
            .authorized(self.http.post(url))
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::new("TRANSPORT", format!("HTTP request failed: {e}")))?;
        decode(response).await
    }
}

async fn decode<Res: DeserializeOwned>(response: Response) -> Result<Res, ApiError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| ApiError::new("DECODE", format!("Failed to parse response: {e}")));
    }

    let body = response.text().await;
    Err(error_from_body(status, body))
}

/// Builds the error for a non-success response. A body that cannot be read
/// still yields an error naming the read failure.
fn error_from_body<E: std::fmt::Display>(status: StatusCode, body: Result<String, E>) -> ApiError {
    let reason = status.canonical_reason().unwrap_or("Unknown error");
    match body {
        Ok(body) => parse_error(status.as_u16(), &body, reason),
        Err(e) => parse_error(
            status.as_u16(),
            "",
            &format!("{reason} (response body unreadable: {e})"),
        ),
    }
}

impl std::fmt::Debug for RestAdsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestAdsClient")
            .field("connection", &self.connection)
            .finish()
    }
}

#[async_trait]
impl AdsService for RestAdsClient {
    #[instrument(skip_all, fields(customer = %customer_id.masked()))]
    async fn search_budgets(
        &self,
        customer_id: &CustomerId,
        query: &str,
    ) -> Result<Vec<BudgetRow>, ApiError> {
        let url = self.endpoint(customer_id, "googleAds:search");
        let mut rows = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let request = SearchRequest {
                query,
                page_token: page_token.as_deref(),
            };
            let page: SearchResponse = self.post(&url, &request).await?;
            rows.extend(page.results.into_iter().map(BudgetRow::from));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(rows = rows.len(), "Search complete");
        Ok(rows)
    }

    #[instrument(skip_all, fields(customer = %customer_id.masked(), budget = %update.resource_name))]
    async fn mutate_campaign_budget(
        &self,
        customer_id: &CustomerId,
        update: &BudgetUpdate,
    ) -> Result<BudgetResourceName, ApiError> {
        let url = self.endpoint(customer_id, "campaignBudgets:mutate");
        let response: MutateResponse = self.post(&url, &MutateRequest::single(update)).await?;

        let resource_name = response
            .results
            .into_iter()
            .next()
            .map(|r| r.resource_name)
            .filter(|r| !r.is_empty())
            .map(BudgetResourceName::new)
            .unwrap_or_else(|| update.resource_name.clone());
        Ok(resource_name)
    }
}
