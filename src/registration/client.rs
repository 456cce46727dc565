use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;

use super::aggregator::{ensure_success, AggregatorClient, RegistrationRequest};
use super::version::{ApiVersion, CompatibilityNegotiator};
use crate::config::RegistrationConfig;
use crate::model::{ComponentHealth, HealthStatus};

/// Latest registration verdict, shared with the health endpoint
#[derive(Debug, Clone, Default)]
pub struct HealthRecord {
    inner: Arc<RwLock<ComponentHealth>>,
}

impl HealthRecord {
    pub fn get(&self) -> ComponentHealth {
        *self.inner.read()
    }

    fn set(&self, health: ComponentHealth) {
        *self.inner.write() = health;
    }
}

/// Announces this adapter to the aggregator
pub struct RegistrationClient {
    config: RegistrationConfig,
    aggregator: Arc<dyn AggregatorClient>,
    negotiator: CompatibilityNegotiator,
    health: HealthRecord,
}

impl RegistrationClient {
    pub fn new(config: RegistrationConfig, aggregator: Arc<dyn AggregatorClient>) -> Self {
        Self {
            negotiator: CompatibilityNegotiator::new(aggregator.clone()),
            config,
            aggregator,
            health: HealthRecord::default(),
        }
    }

    pub fn health(&self) -> ComponentHealth {
        self.health.get()
    }

    pub fn health_record(&self) -> HealthRecord {
        self.health.clone()
    }

    /// Negotiate the protocol, then register once. No internal retry.
    pub async fn register(&self) -> ComponentHealth {
        let version = self.negotiator.resolve().await;
        tracing::debug!("Using API {} for registration", version);
        self.register_with(version).await
    }

    pub async fn register_with(&self, version: ApiVersion) -> ComponentHealth {
        let request = RegistrationRequest::new(&self.config, version);
        let outcome = self
            .aggregator
            .register(version, &request)
            .await
            .and_then(ensure_success);

        let health = match outcome {
            Ok(()) => {
                tracing::debug!(
                    "Registered physical database {} in aggregator",
                    self.config.physical_database_id
                );
                ComponentHealth::ok()
            }
            Err(e) => {
                tracing::warn!("Registration in aggregator failed: {}", e);
                ComponentHealth::problem()
            }
        };
        self.health.set(health);
        health
    }

    /// Register periodically until `shutdown` turns true.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            "Starting registration in aggregator {}",
            self.config.aggregator_url
        );
        loop {
            let health = self.register().await;
            let wait = match health.status {
                HealthStatus::Ok => self.config.full_interval,
                _ => self.config.retry_interval,
            };

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = async { let _ = shutdown.wait_for(|stop| *stop).await; } => break,
            }
        }
        tracing::info!("Registration loop stopped");
    }
}
