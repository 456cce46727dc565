use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    /// Request body could not be decoded. Displays as the decoder's own text.
    #[error("{0}")]
    Decode(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenSearch responded with status {status}: {body}")]
    Cluster { status: u16, body: String },

    #[error("Aggregator responded with status {status}")]
    Aggregator { status: u16 },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AdapterResult<T> = Result<T, AdapterError>;

impl AdapterError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AdapterError::Unauthorized => StatusCode::UNAUTHORIZED,
            AdapterError::Http(_)
            | AdapterError::Cluster { .. }
            | AdapterError::Aggregator { .. } => StatusCode::BAD_GATEWAY,
            AdapterError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AdapterError {
    fn into_response(self) -> Response {
        // Decode failures go back to the aggregator as the raw decoder text
        if let AdapterError::Decode(err) = &self {
            return (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response();
        }

        let status = self.status_code();
        let body = serde_json::json!({
            "error": self.to_string(),
            "code": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
