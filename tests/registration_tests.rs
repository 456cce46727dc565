//! Registration and API version negotiation against an in-process aggregator.

mod common;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, Uri},
    routing::{get, post},
    Json, Router,
};
use dbaas_opensearch_adapter::{
    create_router,
    model::HealthStatus,
    registration::HttpAggregatorClient,
    server::AppState,
    ApiVersion, BasicAuth, CompatibilityNegotiator, ComponentHealth, RecoveryEngine,
    OpenSearchSecurityClient, RegistrationClient, RegistrationConfig, RetryPolicy,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

async fn negotiate(status: StatusCode, body: &'static str) -> ApiVersion {
    let app = Router::new().route("/api-version", get(move || async move { (status, body) }));
    let url = common::spawn_server(app).await;

    let aggregator = HttpAggregatorClient::for_url(url, Duration::from_secs(5)).unwrap();
    CompatibilityNegotiator::new(Arc::new(aggregator)).resolve().await
}

// ============================================================================
// API Version Tests
// ============================================================================

#[tokio::test]
async fn test_api_version() {
    let version = negotiate(
        StatusCode::OK,
        r#"{"major":3,"minor":4,"supportedMajors":[1,2,3]}"#,
    )
    .await;
    assert_eq!(version, ApiVersion::V2);
}

#[tokio::test]
async fn test_api_version_when_v3_not_supported() {
    let version = negotiate(
        StatusCode::OK,
        r#"{"major":2,"minor":4,"supportedMajors":[1,2]}"#,
    )
    .await;
    assert_eq!(version, ApiVersion::V1);
}

#[tokio::test]
async fn test_api_version_with_incorrect_data() {
    let version = negotiate(
        StatusCode::OK,
        r#"{"major":2,"minor":4,"supportedMajors":""}"#,
    )
    .await;
    assert_eq!(version, ApiVersion::V2);
}

#[tokio::test]
async fn test_api_version_when_endpoint_unauthorized() {
    let version = negotiate(StatusCode::UNAUTHORIZED, "").await;
    assert_eq!(version, ApiVersion::V1);
}

#[tokio::test]
async fn test_api_version_when_aggregator_unreachable() {
    // Bind then drop to obtain a port with nothing listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let aggregator = HttpAggregatorClient::for_url(url, Duration::from_secs(2)).unwrap();
    let version = CompatibilityNegotiator::new(Arc::new(aggregator)).resolve().await;
    assert_eq!(version, ApiVersion::V1);
}

// ============================================================================
// Registration Tests
// ============================================================================

#[derive(Clone, Default)]
struct Captured {
    requests: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
}

fn registration_config(url: &str) -> RegistrationConfig {
    RegistrationConfig::new(url, "tmp-test", "http://dbaas-opensearch-adapter.elasticsearch-cluster:8080")
        .with_aggregator_auth(BasicAuth::new("cluster-dba", "test"))
        .with_adapter_auth(BasicAuth::new("dbaas-aggregator", "dbaas-aggregator"))
}

async fn aggregator_answering(status: StatusCode) -> (String, Captured) {
    let captured = Captured::default();

    async fn register(
        State((status, captured)): State<(StatusCode, Captured)>,
        uri: Uri,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> StatusCode {
        let auth = headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .map(str::to_string);
        captured.requests.lock().push((uri.path().to_string(), auth, body));
        status
    }

    let app = Router::new()
        .route(
            "/api-version",
            get(|| async { r#"{"major":3,"minor":4,"supportedMajors":[1,2,3]}"# }),
        )
        .route("/api/v3/dbaas/opensearch/physical_databases/tmp-test", post(register))
        .route("/api/v2/dbaas/opensearch/physical_databases/tmp-test", post(register))
        .with_state((status, captured.clone()));

    (common::spawn_server(app).await, captured)
}

fn registration_client(url: &str) -> RegistrationClient {
    let config = registration_config(url);
    let aggregator = HttpAggregatorClient::new(&config).unwrap();
    RegistrationClient::new(config, Arc::new(aggregator))
}

#[tokio::test]
async fn test_registration() {
    let (url, captured) = aggregator_answering(StatusCode::OK).await;
    let client = registration_client(&url);

    assert_eq!(client.register().await, ComponentHealth { status: HealthStatus::Ok });
    assert_eq!(client.health(), ComponentHealth::ok());

    let requests = captured.requests.lock();
    assert_eq!(requests.len(), 1);
    let (path, auth, body) = &requests[0];
    assert_eq!(path, "/api/v3/dbaas/opensearch/physical_databases/tmp-test");
    assert!(auth.as_deref().unwrap_or_default().starts_with("Basic "));
    assert_eq!(
        body["adapterAddress"],
        "http://dbaas-opensearch-adapter.elasticsearch-cluster:8080"
    );
    assert_eq!(body["httpBasicAuth"]["username"], "dbaas-aggregator");
    assert_eq!(body["features"]["multiusers"], true);
}

#[tokio::test]
async fn test_failed_registration() {
    let (url, _captured) = aggregator_answering(StatusCode::INTERNAL_SERVER_ERROR).await;
    let client = registration_client(&url);

    assert_eq!(client.register().await, ComponentHealth::problem());
    assert_eq!(client.health().status, HealthStatus::Problem);
}

#[tokio::test]
async fn test_registration_with_v1_path() {
    let (url, captured) = aggregator_answering(StatusCode::OK).await;
    let client = registration_client(&url);

    assert_eq!(client.register_with(ApiVersion::V1).await, ComponentHealth::ok());

    let requests = captured.requests.lock();
    assert_eq!(requests[0].0, "/api/v2/dbaas/opensearch/physical_databases/tmp-test");
    assert!(requests[0].2.get("supportedRoles").is_none());
}

#[tokio::test]
async fn test_health_endpoint_reflects_registration() {
    let (url, _captured) = aggregator_answering(StatusCode::OK).await;
    let client = registration_client(&url);
    client.register().await;

    let security =
        OpenSearchSecurityClient::new("http://127.0.0.1:9", BasicAuth::default(), Duration::from_secs(1))
            .unwrap();
    let engine = RecoveryEngine::new(Arc::new(security), RetryPolicy::default());
    let app = create_router(AppState::new(engine, client.health_record(), BasicAuth::default()));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["status"], "OK");
    assert_eq!(json["dbaasAggregatorHealth"]["status"], "OK");
}
