//! Protocol negotiation with the aggregator.
//!
//! The aggregator advertises its API version on a dedicated endpoint.
//! Resolution never fails: a rejected or unreachable endpoint means an old
//! aggregator (V1), while a reachable endpoint with an unexpected payload
//! is treated as a newer one (V2).

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::aggregator::AggregatorClient;

/// Major version of the aggregator API that enables the V2 protocol.
const V2_AGGREGATOR_MAJOR: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiVersion {
    #[serde(rename = "v1")]
    V1,
    #[serde(rename = "v2")]
    V2,
}

impl ApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V2 => "v2",
        }
    }

    /// Aggregator API generation used for the registration path.
    pub fn aggregator_api(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "v2",
            ApiVersion::V2 => "v3",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVersionInfo {
    pub major: i64,
    pub minor: i64,
    pub supported_majors: Vec<i64>,
}

impl ApiVersionInfo {
    pub fn protocol(&self) -> ApiVersion {
        if self.major >= V2_AGGREGATOR_MAJOR && self.supported_majors.contains(&V2_AGGREGATOR_MAJOR) {
            ApiVersion::V2
        } else {
            ApiVersion::V1
        }
    }
}

/// Raw outcome of querying the version endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionReply {
    /// 2xx response with its body
    Payload(Vec<u8>),
    /// Non-success HTTP status
    Rejected(u16),
    /// Transport failure before any status was received
    Unreachable(String),
}

pub fn resolve_api_version(reply: &VersionReply) -> ApiVersion {
    match reply {
        VersionReply::Rejected(status) => {
            tracing::debug!("Version endpoint answered {}, assuming API v1", status);
            ApiVersion::V1
        }
        VersionReply::Unreachable(reason) => {
            tracing::debug!("Version endpoint unreachable ({}), assuming API v1", reason);
            ApiVersion::V1
        }
        VersionReply::Payload(body) => match serde_json::from_slice::<ApiVersionInfo>(body) {
            Ok(info) => info.protocol(),
            Err(e) => {
                tracing::warn!("Unexpected version payload ({}), assuming API v2", e);
                ApiVersion::V2
            }
        },
    }
}

/// Queries the aggregator and picks the protocol. Results are not cached.
#[derive(Clone)]
pub struct CompatibilityNegotiator {
    aggregator: Arc<dyn AggregatorClient>,
}

impl CompatibilityNegotiator {
    pub fn new(aggregator: Arc<dyn AggregatorClient>) -> Self {
        Self { aggregator }
    }

    pub async fn resolve(&self) -> ApiVersion {
        let reply = self.aggregator.fetch_api_version().await;
        resolve_api_version(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(body: &str) -> VersionReply {
        VersionReply::Payload(body.as_bytes().to_vec())
    }

    #[test]
    fn test_v3_aggregator_selects_v2() {
        let reply = payload(r#"{"major":3,"minor":4,"supportedMajors":[1,2,3]}"#);
        assert_eq!(resolve_api_version(&reply), ApiVersion::V2);
    }

    #[test]
    fn test_v2_aggregator_selects_v1() {
        let reply = payload(r#"{"major":2,"minor":4,"supportedMajors":[1,2]}"#);
        assert_eq!(resolve_api_version(&reply), ApiVersion::V1);
    }

    #[test]
    fn test_major_without_supported_three_selects_v1() {
        let reply = payload(r#"{"major":4,"minor":0,"supportedMajors":[4]}"#);
        assert_eq!(resolve_api_version(&reply), ApiVersion::V1);
    }

    #[test]
    fn test_malformed_payload_selects_v2() {
        let reply = payload(r#"{"major":2,"minor":4,"supportedMajors":""}"#);
        assert_eq!(resolve_api_version(&reply), ApiVersion::V2);
        assert_eq!(resolve_api_version(&payload("")), ApiVersion::V2);
    }

    #[test]
    fn test_rejected_or_unreachable_selects_v1() {
        assert_eq!(resolve_api_version(&VersionReply::Rejected(401)), ApiVersion::V1);
        assert_eq!(resolve_api_version(&VersionReply::Rejected(404)), ApiVersion::V1);
        assert_eq!(
            resolve_api_version(&VersionReply::Unreachable("connection refused".to_string())),
            ApiVersion::V1
        );
    }

    #[test]
    fn test_aggregator_api_paths() {
        assert_eq!(ApiVersion::V1.aggregator_api(), "v2");
        assert_eq!(ApiVersion::V2.aggregator_api(), "v3");
    }
}
