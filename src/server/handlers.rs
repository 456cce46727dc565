use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::AdapterError;
use crate::model::{BasicAuth, ComponentHealth, HealthStatus};
use crate::recovery::{RecoveryEngine, RecoveryRequest};
use crate::registration::HealthRecord;

#[derive(Clone)]
pub struct AppState {
    pub recovery: RecoveryEngine,
    pub health: HealthRecord,
    /// Credentials the aggregator presents on protected routes
    pub adapter_auth: Arc<BasicAuth>,
}

impl AppState {
    pub fn new(recovery: RecoveryEngine, health: HealthRecord, adapter_auth: BasicAuth) -> Self {
        Self {
            recovery,
            health,
            adapter_auth: Arc::new(adapter_auth),
        }
    }
}

// ==================== Response Types ====================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub dbaas_aggregator_health: ComponentHealth,
}

// ==================== Recovery Handlers ====================

/// POST /api/v2/dbaas/adapter/opensearch/users/restore-password
///
/// Accepts the credential set and starts recovery in the background.
/// Duplicate requests while a run is in progress are acknowledged and dropped.
pub async fn recover_users(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, AdapterError> {
    let request: RecoveryRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!("Failed to decode request in recover users handler: {}", e);
        AdapterError::from(e)
    })?;

    state.recovery.trigger(request);
    Ok(StatusCode::OK)
}

/// GET /api/v2/dbaas/adapter/opensearch/users/restore-password/state
pub async fn get_recovery_state(State(state): State<AppState>) -> (StatusCode, &'static str) {
    (StatusCode::OK, state.recovery.state().as_str())
}

// ==================== Health ====================

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let aggregator = state.health.get();
    Json(HealthResponse {
        status: aggregator.status,
        dbaas_aggregator_health: aggregator,
    })
}
