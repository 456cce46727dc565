//! Shared data model exchanged with the aggregator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One tenant credential the aggregator wants present in the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionProperties {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_prefix: Option<String>,
    #[serde(default)]
    pub db_name: String,
}

impl ConnectionProperties {
    /// Role name if one was supplied and is non-empty.
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref().filter(|r| !r.is_empty())
    }

    /// Resource prefix, falling back to the database name.
    pub fn resource_prefix_or_db_name(&self) -> &str {
        self.resource_prefix
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(self.db_name.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    /// No registration attempt has completed yet
    #[default]
    Unknown,
    Ok,
    Problem,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HealthStatus::Unknown => "UNKNOWN",
            HealthStatus::Ok => "OK",
            HealthStatus::Problem => "PROBLEM",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: HealthStatus,
}

impl ComponentHealth {
    pub fn ok() -> Self {
        Self {
            status: HealthStatus::Ok,
        }
    }

    pub fn problem() -> Self {
        Self {
            status: HealthStatus::Problem,
        }
    }
}
