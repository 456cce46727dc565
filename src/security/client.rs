//! Client for the OpenSearch security plugin REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;

use crate::config::trim_base_url;
use crate::error::{AdapterError, AdapterResult};
use crate::model::BasicAuth;
use crate::recovery::change::{Change, Content};

const INTERNAL_USERS_PATH: &str = "/_plugins/_security/api/internalusers";
const ROLES_PATH: &str = "/_plugins/_security/api/roles";
const ROLES_MAPPING_PATH: &str = "/_plugins/_security/api/rolesmapping";

/// Capability the recovery engine depends on
#[async_trait]
pub trait SecurityApiClient: Send + Sync {
    /// Apply all changes as a single bulk patch of internal users.
    async fn patch_users(&self, changes: &[Change]) -> AdapterResult<()>;
}

#[derive(Clone)]
pub struct OpenSearchSecurityClient {
    base_url: String,
    auth: BasicAuth,
    http_client: Client,
}

impl OpenSearchSecurityClient {
    pub fn new(base_url: impl Into<String>, auth: BasicAuth, timeout: Duration) -> AdapterResult<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, auth, http_client))
    }

    pub fn with_client(base_url: impl Into<String>, auth: BasicAuth, http_client: Client) -> Self {
        Self {
            base_url: trim_base_url(base_url.into()),
            auth,
            http_client,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.http_client.request(method, url);
        if self.auth.username.is_empty() {
            builder
        } else {
            builder.basic_auth(&self.auth.username, Some(&self.auth.password))
        }
    }

    /// Send the request and map any non-2xx status to [`AdapterError::Cluster`].
    async fn send(&self, request: RequestBuilder) -> AdapterResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::Cluster {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn execute(&self, request: RequestBuilder) -> AdapterResult<Value> {
        let bytes = self.send(request).await?.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Create or replace a single internal user.
    pub async fn create_user(&self, username: &str, content: &Content) -> AdapterResult<Value> {
        let path = format!("{}/{}", INTERNAL_USERS_PATH, username);
        self.execute(self.request(Method::PUT, &path).json(content)).await
    }

    /// Apply JSON-Patch operations to the fields of one user.
    pub async fn patch_user(&self, username: &str, operations: &Value) -> AdapterResult<Value> {
        let path = format!("{}/{}", INTERNAL_USERS_PATH, username);
        self.execute(self.request(Method::PATCH, &path).json(operations)).await
    }

    pub async fn get_users(&self) -> AdapterResult<Value> {
        self.execute(self.request(Method::GET, INTERNAL_USERS_PATH)).await
    }

    pub async fn get_role(&self, name: &str) -> AdapterResult<Value> {
        let path = format!("{}/{}", ROLES_PATH, name);
        self.execute(self.request(Method::GET, &path)).await
    }

    pub async fn get_roles(&self) -> AdapterResult<Value> {
        self.execute(self.request(Method::GET, ROLES_PATH)).await
    }

    pub async fn get_roles_mapping(&self, name: &str) -> AdapterResult<Value> {
        let path = format!("{}/{}", ROLES_MAPPING_PATH, name);
        self.execute(self.request(Method::GET, &path)).await
    }
}

#[async_trait]
impl SecurityApiClient for OpenSearchSecurityClient {
    async fn patch_users(&self, changes: &[Change]) -> AdapterResult<()> {
        // 2xx is success whatever the body says
        let request = self.request(Method::PATCH, INTERNAL_USERS_PATH).json(changes);
        self.send(request).await?;
        Ok(())
    }
}

impl std::fmt::Debug for OpenSearchSecurityClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenSearchSecurityClient")
            .field("base_url", &self.base_url)
            .field("username", &self.auth.username)
            .finish()
    }
}
