pub mod aggregator;
pub mod client;
pub mod version;

pub use aggregator::{AggregatorClient, HttpAggregatorClient, RegistrationRequest};
pub use client::{HealthRecord, RegistrationClient};
pub use version::{resolve_api_version, ApiVersion, ApiVersionInfo, CompatibilityNegotiator, VersionReply};
