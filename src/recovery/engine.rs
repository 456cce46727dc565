//! Background replay of user credentials against the security API.
//!
//! The engine owns the process-wide [`RecoveryState`]. A trigger atomically
//! moves the state to `running` and spawns one job; triggers that arrive
//! while a job is running are ignored. The job applies batches strictly in
//! order and stops at the first batch that exhausts its retry budget.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::change::{batches, build_changes, Change};
use super::state::RecoveryState;
use crate::config::RetryPolicy;
use crate::error::{AdapterError, AdapterResult};
use crate::model::ConnectionProperties;
use crate::security::SecurityApiClient;

/// Body of a recovery request sent by the aggregator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Map<String, Value>>,
    #[serde(default)]
    pub connection_properties: Vec<ConnectionProperties>,
}

#[derive(Clone)]
pub struct RecoveryEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    client: Arc<dyn SecurityApiClient>,
    policy: RetryPolicy,
    state: watch::Sender<RecoveryState>,
    shutdown: watch::Sender<bool>,
    job: Mutex<Option<JoinHandle<()>>>,
}

impl RecoveryEngine {
    pub fn new(client: Arc<dyn SecurityApiClient>, policy: RetryPolicy) -> Self {
        let (state, _) = watch::channel(RecoveryState::Idle);
        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(EngineInner {
                client,
                policy,
                state,
                shutdown,
                job: Mutex::new(None),
            }),
        }
    }

    /// Start a recovery run unless one is already running.
    ///
    /// Returns immediately; `true` when a new job was spawned.
    pub fn trigger(&self, request: RecoveryRequest) -> bool {
        // Held until the handle is stored so shutdown never misses a job
        let mut job = self.inner.job.lock();
        if *self.inner.shutdown.borrow() {
            tracing::warn!("Recovery trigger ignored: adapter is shutting down");
            return false;
        }

        let started = self.inner.state.send_if_modified(|state| {
            if *state == RecoveryState::Running {
                false
            } else {
                *state = RecoveryState::Running;
                true
            }
        });

        if !started {
            tracing::debug!("Recovery is already running, trigger ignored");
            return false;
        }

        tracing::info!(
            "Starting recovery of {} users",
            request.connection_properties.len()
        );
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            inner.run(request.connection_properties).await;
        });
        *job = Some(handle);
        true
    }

    pub fn state(&self) -> RecoveryState {
        *self.inner.state.borrow()
    }

    /// Resolve once no run is in progress and return the resulting state.
    pub async fn wait(&self) -> RecoveryState {
        let mut rx = self.inner.state.subscribe();
        let result = rx
            .wait_for(|state| *state != RecoveryState::Running)
            .await
            .map(|state| *state);
        result.unwrap_or_else(|_| self.state())
    }

    /// Interrupt any pending retry wait and wait for the job to stop.
    pub async fn shutdown(&self) {
        self.inner.shutdown.send_replace(true);
        let handle = self.inner.job.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!("Recovery job terminated abnormally: {}", e);
                self.inner.state.send_replace(RecoveryState::Failed);
            }
        }
    }
}

impl EngineInner {
    async fn run(&self, properties: Vec<ConnectionProperties>) {
        let final_state = match self.apply(&properties).await {
            Ok(()) => {
                tracing::info!("Users recovery is successfully finished");
                RecoveryState::Done
            }
            Err(e) => {
                tracing::error!("Unable to restore users because of error: {}", e);
                RecoveryState::Failed
            }
        };
        self.state.send_replace(final_state);
    }

    async fn apply(&self, properties: &[ConnectionProperties]) -> AdapterResult<()> {
        let changes = build_changes(properties);
        let total = batches(&changes, self.policy.batch_size).len();

        for (index, batch) in batches(&changes, self.policy.batch_size).enumerate() {
            if *self.shutdown.borrow() {
                return Err(AdapterError::Cancelled);
            }
            tracing::debug!(
                "Current batch {}/{} size is {}",
                index + 1,
                total,
                batch.len()
            );
            self.patch_with_retry(batch).await?;
        }
        Ok(())
    }

    async fn patch_with_retry(&self, batch: &[Change]) -> AdapterResult<()> {
        let mut shutdown = self.shutdown.subscribe();
        let mut attempt = 1;
        loop {
            let err = match self.patch_once(batch).await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };
            if attempt >= self.policy.max_attempts {
                return Err(err);
            }
            tracing::warn!(
                "Patch attempt {}/{} failed: {}",
                attempt,
                self.policy.max_attempts,
                err
            );

            tokio::select! {
                _ = tokio::time::sleep(self.policy.retry_delay) => {}
                _ = cancelled(&mut shutdown) => return Err(AdapterError::Cancelled),
            }
            attempt += 1;
        }
    }

    async fn patch_once(&self, batch: &[Change]) -> AdapterResult<()> {
        match tokio::time::timeout(self.policy.request_timeout, self.client.patch_users(batch)).await {
            Ok(result) => result,
            Err(_) => Err(AdapterError::Timeout(format!(
                "patching {} users took longer than {:?}",
                batch.len(),
                self.policy.request_timeout
            ))),
        }
    }
}

async fn cancelled(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}
