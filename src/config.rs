use std::time::Duration;

use crate::error::{AdapterError, AdapterResult};
use crate::model::BasicAuth;

/// Retry and batching policy applied by the recovery job
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of changes sent in one bulk patch
    pub batch_size: usize,
    /// Total attempts per batch, including the first one
    pub max_attempts: u32,
    /// Pause between two attempts of the same batch
    pub retry_delay: Duration,
    /// Upper bound for a single security API call
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            batch_size: 100,
            max_attempts: 3,
            retry_delay: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Overlay `RECOVERY_*` environment variables on the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            batch_size: env_parse("RECOVERY_BATCH_SIZE").unwrap_or(defaults.batch_size),
            max_attempts: env_parse("RECOVERY_MAX_ATTEMPTS").unwrap_or(defaults.max_attempts),
            retry_delay: env_parse("RECOVERY_RETRY_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
            request_timeout: env_parse("RECOVERY_REQUEST_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),
        }
    }

    pub fn validate(&self) -> AdapterResult<()> {
        if self.batch_size == 0 {
            return Err(AdapterError::Config("batch size must be positive".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(AdapterError::Config("at least one attempt is required".to_string()));
        }
        Ok(())
    }
}

/// Everything the registration driver needs to announce this adapter
#[derive(Debug, Clone)]
pub struct RegistrationConfig {
    /// Base URL of the DBaaS aggregator
    pub aggregator_url: String,
    /// Credentials used to call the aggregator
    pub aggregator_auth: BasicAuth,
    pub physical_database_id: String,
    /// Address the aggregator uses to reach this adapter
    pub adapter_address: String,
    /// Credentials the aggregator must present when calling back
    pub adapter_auth: BasicAuth,
    /// Wait after a successful registration
    pub full_interval: Duration,
    /// Wait after a failed registration
    pub retry_interval: Duration,
    pub request_timeout: Duration,
}

impl RegistrationConfig {
    pub fn new(
        aggregator_url: impl Into<String>,
        physical_database_id: impl Into<String>,
        adapter_address: impl Into<String>,
    ) -> Self {
        Self {
            aggregator_url: trim_base_url(aggregator_url.into()),
            aggregator_auth: BasicAuth::default(),
            physical_database_id: physical_database_id.into(),
            adapter_address: adapter_address.into(),
            adapter_auth: BasicAuth::default(),
            full_interval: Duration::from_millis(150_000),
            retry_interval: Duration::from_millis(60_000),
            request_timeout: Duration::from_millis(5_000),
        }
    }

    pub fn with_aggregator_auth(mut self, auth: BasicAuth) -> Self {
        self.aggregator_auth = auth;
        self
    }

    pub fn with_adapter_auth(mut self, auth: BasicAuth) -> Self {
        self.adapter_auth = auth;
        self
    }
}

/// Top-level configuration assembled by the binary
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    pub port: u16,
    pub opensearch_url: String,
    pub opensearch_auth: BasicAuth,
    /// Credentials required on the recovery endpoints
    pub adapter_auth: BasicAuth,
    pub retry: RetryPolicy,
    /// Absent when the adapter runs without an aggregator
    pub registration: Option<RegistrationConfig>,
}

impl AdapterConfig {
    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

/// Read `<PREFIX>_USERNAME` / `<PREFIX>_PASSWORD` from the environment.
pub fn env_auth(prefix: &str) -> BasicAuth {
    BasicAuth {
        username: std::env::var(format!("{}_USERNAME", prefix)).unwrap_or_default(),
        password: std::env::var(format!("{}_PASSWORD", prefix)).unwrap_or_default(),
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Strip surrounding whitespace and trailing slashes so paths can be appended.
pub fn trim_base_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}
