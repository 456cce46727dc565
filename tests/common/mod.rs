//! Common test utilities
//!
//! Provides shared helpers for:
//! - Spawning in-process HTTP servers that stand in for OpenSearch or the aggregator
//! - Building recovery requests

#![allow(dead_code)]

use axum::Router;
use dbaas_opensearch_adapter::ConnectionProperties;
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Test server failed");
    });
    format!("http://{}", addr)
}

pub fn connection_properties(n: usize) -> Vec<ConnectionProperties> {
    (0..n)
        .map(|i| ConnectionProperties {
            username: format!("user{}", i),
            password: format!("pass{}", i),
            role: None,
            resource_prefix: None,
            db_name: format!("db{}", i),
        })
        .collect()
}

pub fn recovery_body(n: usize) -> Value {
    json!({
        "settings": {"source": "test"},
        "connectionProperties": connection_properties(n),
    })
}
