//! The TOML configuration file.
//!
//! ```toml
//! [connection]
//! customer_id = "123-456-7890"
//! developer_token_env = "ADS_DEVELOPER_TOKEN"
//! access_token_env = "ADS_ACCESS_TOKEN"
//!
//! [columns]
//! campaign_column = "campaign.resource_name"
//! budget_column = "campaign.campaign_budget"
//!
//! [policy]
//! direction = "INCREASE"
//! cap_mode = "PER_CAMPAIGN"
//! step_mode = "ABSOLUTE"
//! step_value = 25.0
//!
//! [observability]
//! log_format = "json"
//! ```

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use ads::{AdsConnection, DEFAULT_API_VERSION, DEFAULT_BASE_URL};
use nodes::ColumnMapping;
use pipeline::{CustomerId, PolicySettings};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    pub connection: ConnectionConfig,
    pub columns: ColumnMapping,
    #[serde(default)]
    pub policy: PolicySettings,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    pub customer_id: String,
    #[serde(default)]
    pub login_customer_id: Option<String>,
    /// Name of the environment variable holding the developer token.
    #[serde(default = "default_developer_token_env")]
    pub developer_token_env: String,
    /// Name of the environment variable holding the OAuth access token.
    #[serde(default = "default_access_token_env")]
    pub access_token_env: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
    /// OTLP gRPC endpoint; spans are only exported when set.
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            otlp_endpoint: None,
            service_name: "budget-updater".to_string(),
        }
    }
}

fn default_developer_token_env() -> String {
    "ADS_DEVELOPER_TOKEN".to_string()
}

fn default_access_token_env() -> String {
    "ADS_ACCESS_TOKEN".to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

impl CliConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

impl ConnectionConfig {
    pub fn customer_id(&self) -> Result<CustomerId> {
        CustomerId::parse(&self.customer_id)
            .ok_or_else(|| anyhow!("connection.customer_id is empty"))
    }

    /// Resolves the connection, reading secrets from the environment.
    pub fn resolve(&self) -> Result<AdsConnection> {
        let login_customer_id = self
            .login_customer_id
            .as_deref()
            .and_then(CustomerId::parse);
        Ok(AdsConnection {
            base_url: self.base_url.clone(),
            api_version: self.api_version.clone(),
            developer_token: read_secret(&self.developer_token_env)?,
            access_token: read_secret(&self.access_token_env)?,
            login_customer_id,
        })
    }
}

fn read_secret(var: &str) -> Result<String> {
    std::env::var(var).with_context(|| format!("environment variable {var} is not set"))
}
