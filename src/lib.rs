pub mod config;
pub mod error;
pub mod model;
pub mod recovery;
pub mod registration;
pub mod security;
pub mod server;

pub use config::{AdapterConfig, RegistrationConfig, RetryPolicy};
pub use error::{AdapterError, AdapterResult};
pub use model::{BasicAuth, ComponentHealth, ConnectionProperties, HealthStatus};
pub use recovery::{RecoveryEngine, RecoveryRequest, RecoveryState};
pub use registration::{ApiVersion, CompatibilityNegotiator, RegistrationClient};
pub use security::{OpenSearchSecurityClient, SecurityApiClient};
pub use server::create_router;
