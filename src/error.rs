//! Error taxonomy for the request pipeline.
//!
//! # Responsibilities
//! - Classify terminal upstream failures (timeout vs. connection)
//! - Map each failure class to an HTTP status and JSON diagnostic body
//! - Keep internal faults generic toward the client (no stack traces)

use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use thiserror::Error;

/// Terminal failure of one proxied request.
///
/// Failures are terminal at the request boundary: a failed request never
/// poisons the session store or other clients.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// All attempts timed out.
    #[error("upstream timed out after {attempts} attempts: {url}")]
    Timeout { url: String, attempts: u32 },

    /// All attempts failed at the connection level (refused, DNS, reset).
    #[error("upstream connection failed after {attempts} attempts: {url}: {message}")]
    Connect {
        url: String,
        attempts: u32,
        message: String,
    },

    /// Unexpected fault inside the pipeline.
    #[error("internal proxy error on {path}: {message}")]
    Internal { path: String, message: String },
}

impl ProxyError {
    /// Client-facing status code for this failure class.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Connect { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON diagnostic body relayed to the client.
    pub fn diagnostic(&self) -> serde_json::Value {
        match self {
            ProxyError::Timeout { url, attempts } => serde_json::json!({
                "error": "Gateway timeout after retries",
                "message": "upstream did not respond within the attempt budget",
                "url": url,
                "attempts": attempts,
            }),
            ProxyError::Connect {
                url,
                attempts,
                message,
            } => serde_json::json!({
                "error": "Connection failed after retries",
                "message": message,
                "url": url,
                "attempts": attempts,
            }),
            ProxyError::Internal { path, message } => serde_json::json!({
                "error": "Proxy internal error",
                "message": message,
                "path": path,
            }),
        }
    }

    /// Build the client response. CORS headers are stamped by the caller
    /// so the policy stays uniform across success and failure paths.
    pub fn into_response(self) -> Response<Body> {
        let body = self.diagnostic().to_string();
        Response::builder()
            .status(self.status())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap_or_else(|_| Response::new(Body::empty()))
    }
}
