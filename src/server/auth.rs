use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use base64::Engine;

use crate::error::AdapterError;
use crate::model::BasicAuth;
use crate::server::handlers::AppState;

/// Require `Authorization: Basic` with the adapter's callback credentials.
///
/// Disabled when no adapter username is configured.
pub async fn basic_auth_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AdapterError> {
    if state.adapter_auth.username.is_empty() {
        return Ok(next.run(req).await);
    }

    let presented = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(parse_basic_auth);

    // Plain equality, not a constant-time comparison
    match presented {
        Some(credentials) if credentials == *state.adapter_auth => Ok(next.run(req).await),
        _ => {
            tracing::debug!("Rejected request to {} with missing or invalid credentials", req.uri());
            Err(AdapterError::Unauthorized)
        }
    }
}

/// Decode `Basic <base64(user:pass)>`.
pub fn parse_basic_auth(header: &str) -> Option<BasicAuth> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (username, password) = credentials.split_once(':')?;
    Some(BasicAuth::new(username, password))
}
