//! HTTP access to the DBaaS aggregator.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::version::{ApiVersion, VersionReply};
use crate::config::{trim_base_url, RegistrationConfig};
use crate::error::{AdapterError, AdapterResult};
use crate::model::BasicAuth;
use crate::security::roles::SUPPORTED_ROLE_TYPES;

pub const API_VERSION_PATH: &str = "/api-version";
pub const DB_TYPE: &str = "opensearch";

/// Self-description announced to the aggregator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub adapter_address: String,
    pub http_basic_auth: BasicAuth,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_roles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<BTreeMap<String, bool>>,
}

impl RegistrationRequest {
    pub fn new(config: &RegistrationConfig, version: ApiVersion) -> Self {
        let (supported_roles, features) = match version {
            ApiVersion::V1 => (None, None),
            ApiVersion::V2 => {
                let roles = SUPPORTED_ROLE_TYPES.iter().map(|r| r.to_string()).collect();
                let mut features = BTreeMap::new();
                features.insert("multiusers".to_string(), true);
                (Some(roles), Some(features))
            }
        };

        Self {
            adapter_address: config.adapter_address.clone(),
            http_basic_auth: config.adapter_auth.clone(),
            supported_roles,
            features,
        }
    }
}

/// Aggregator operations needed by registration
#[async_trait]
pub trait AggregatorClient: Send + Sync {
    async fn fetch_api_version(&self) -> VersionReply;

    /// Send a registration; returns the HTTP status the aggregator answered with.
    async fn register(&self, version: ApiVersion, request: &RegistrationRequest) -> AdapterResult<u16>;
}

#[derive(Clone)]
pub struct HttpAggregatorClient {
    base_url: String,
    physical_database_id: String,
    auth: BasicAuth,
    http_client: Client,
}

impl HttpAggregatorClient {
    pub fn new(config: &RegistrationConfig) -> AdapterResult<Self> {
        let http_client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self::with_client(config, http_client))
    }

    pub fn with_client(config: &RegistrationConfig, http_client: Client) -> Self {
        Self {
            base_url: trim_base_url(config.aggregator_url.clone()),
            physical_database_id: config.physical_database_id.clone(),
            auth: config.aggregator_auth.clone(),
            http_client,
        }
    }

    /// Plain client pointed at `base_url`, for one-off version probes.
    pub fn for_url(base_url: impl Into<String>, timeout: Duration) -> AdapterResult<Self> {
        let config = RegistrationConfig {
            request_timeout: timeout,
            ..RegistrationConfig::new(base_url, "", "")
        };
        Self::new(&config)
    }

    pub fn registration_url(&self, version: ApiVersion) -> String {
        format!(
            "{}/api/{}/dbaas/{}/physical_databases/{}",
            self.base_url,
            version.aggregator_api(),
            DB_TYPE,
            self.physical_database_id
        )
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.auth.username.is_empty() {
            builder
        } else {
            builder.basic_auth(&self.auth.username, Some(&self.auth.password))
        }
    }
}

#[async_trait]
impl AggregatorClient for HttpAggregatorClient {
    async fn fetch_api_version(&self) -> VersionReply {
        let url = format!("{}{}", self.base_url, API_VERSION_PATH);
        let response = match self.authorize(self.http_client.get(&url)).send().await {
            Ok(response) => response,
            Err(e) => return VersionReply::Unreachable(e.to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            return VersionReply::Rejected(status.as_u16());
        }
        match response.bytes().await {
            Ok(body) => VersionReply::Payload(body.to_vec()),
            // Body cut short after a success status; treated like a malformed payload
            Err(_) => VersionReply::Payload(Vec::new()),
        }
    }

    async fn register(&self, version: ApiVersion, request: &RegistrationRequest) -> AdapterResult<u16> {
        let url = self.registration_url(version);
        let response = self
            .authorize(self.http_client.post(&url))
            .json(request)
            .send()
            .await?;
        Ok(response.status().as_u16())
    }
}

impl std::fmt::Debug for HttpAggregatorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAggregatorClient")
            .field("base_url", &self.base_url)
            .field("physical_database_id", &self.physical_database_id)
            .finish()
    }
}

/// Fail with [`AdapterError::Aggregator`] unless `status` is 2xx.
pub fn ensure_success(status: u16) -> AdapterResult<()> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(AdapterError::Aggregator { status })
    }
}
