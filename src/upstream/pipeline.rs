//! Upstream request pipeline.
//!
//! # Responsibilities
//! - Build one outbound call per inbound request
//! - Run the attempt loop with progressive timeouts
//! - Merge response cookies into the session store on success
//! - Rewrite response headers for the proxy's own origin
//!
//! # Design Decisions
//! - Every attempt builds a fresh header set and re-reads the cookie
//!   store; no mutable request object crosses attempts
//! - An HTTP error status from the upstream is a definitive answer:
//!   relayed immediately, never retried
//! - Only timeouts and connection-level errors consume retry attempts
//! - The store is written exactly once, on the successful attempt

use axum::body::{Body, Bytes};
use axum::http::header::{HeaderValue, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, Method, Response};

use crate::config::{RetryConfig, UpstreamConfig};
use crate::error::ProxyError;
use crate::session::{cookies, SessionStore};
use crate::upstream::client::UpstreamClient;
use crate::upstream::{headers, path};

/// Response headers never copied through from the upstream.
///
/// CORS headers are regenerated by the policy layer, `Set-Cookie` is
/// rewritten, and the framing headers no longer match the decoded body.
const SKIPPED_RESPONSE_HEADERS: [&str; 10] = [
    "connection",
    "set-cookie",
    "access-control-allow-origin",
    "access-control-allow-methods",
    "access-control-allow-headers",
    "access-control-allow-credentials",
    "access-control-expose-headers",
    "content-length",
    "transfer-encoding",
    "content-encoding",
];

enum AttemptError {
    Timeout,
    Connect(String),
}

/// Forward one inbound request to the upstream, retrying transient
/// failures, and produce the client-facing response.
///
/// `original_path` is the inbound path including any query string.
/// CORS headers are stamped by the caller.
pub async fn forward(
    client: &UpstreamClient,
    store: &SessionStore,
    retry: &RetryConfig,
    upstream: &UpstreamConfig,
    client_id: &str,
    method: Method,
    original_path: &str,
    inbound_headers: &HeaderMap,
    body: Option<Bytes>,
) -> Result<Response<Body>, ProxyError> {
    let upstream_path = match &upstream.path_override {
        Some(override_path) => override_path.clone(),
        None => path::normalize(original_path, &upstream.route_prefix),
    };
    let url = format!("{}{}", client.origin(), upstream_path);

    tracing::debug!(
        client_id = %client_id,
        method = %method,
        original_path = %original_path,
        upstream_url = %url,
        "Forwarding to upstream"
    );

    let browser_cookies = inbound_headers
        .get(COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let budget = retry.attempt_budget();
    let mut attempt = 0;

    loop {
        // Fresh cookie lookup per attempt: a concurrent request may have
        // merged new state since the previous one.
        let cookie_header = store
            .cookie_header(client_id)
            .or_else(|| browser_cookies.clone());

        let outbound_headers =
            headers::build_outbound(inbound_headers, client.origin(), cookie_header.as_deref());

        let timeout = retry.timeout_for_attempt(attempt);
        tracing::debug!(
            client_id = %client_id,
            attempt = attempt + 1,
            budget,
            timeout_secs = timeout.as_secs(),
            "Upstream attempt"
        );

        let result = client
            .send(method.clone(), &url, outbound_headers, body.clone(), timeout)
            .await;

        let error = match result {
            Ok(response) => {
                match relay_response(response, store, client_id, original_path).await {
                    Ok(relayed) => return Ok(relayed),
                    Err(e) => e,
                }
            }
            Err(e) => classify(&e),
        };

        match &error {
            AttemptError::Timeout => {
                tracing::warn!(client_id = %client_id, attempt = attempt + 1, upstream_url = %url, "Upstream attempt timed out");
            }
            AttemptError::Connect(message) => {
                tracing::warn!(client_id = %client_id, attempt = attempt + 1, upstream_url = %url, error = %message, "Upstream attempt failed");
            }
        }

        attempt += 1;
        if attempt >= budget {
            return Err(match error {
                AttemptError::Timeout => ProxyError::Timeout {
                    url,
                    attempts: budget,
                },
                AttemptError::Connect(message) => ProxyError::Connect {
                    url,
                    attempts: budget,
                    message,
                },
            });
        }

        tokio::time::sleep(retry.delay_between_attempts()).await;
    }
}

/// Turn an upstream response into the client-facing response.
///
/// Returns `Err` only for failures worth another attempt (a timeout or
/// connection drop while reading the body).
async fn relay_response(
    response: reqwest::Response,
    store: &SessionStore,
    client_id: &str,
    original_path: &str,
) -> Result<Response<Body>, AttemptError> {
    let status = response.status();
    let upstream_headers = response.headers().clone();

    let body_bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => return Err(classify(&e)),
    };

    // A status >= 400 is a definitive upstream answer: relay as-is.
    if status.is_client_error() || status.is_server_error() {
        tracing::debug!(
            client_id = %client_id,
            status = %status,
            path = %original_path,
            "Relaying upstream error response"
        );

        let content_type = upstream_headers
            .get(CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("application/json"));

        let mut builder = Response::builder().status(status);
        if let Some(headers) = builder.headers_mut() {
            headers.insert(CONTENT_TYPE, content_type);
        }
        return builder
            .body(Body::from(body_bytes))
            .map_err(|e| AttemptError::Connect(e.to_string()));
    }

    // Success: this is the only point where the store is written.
    let new_pairs: Vec<(String, String)> = upstream_headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(cookies::leading_pair)
        .collect();
    store.merge(client_id, &new_pairs);

    let mut builder = Response::builder().status(status);
    if let Some(response_headers) = builder.headers_mut() {
        for (name, value) in upstream_headers.iter() {
            if SKIPPED_RESPONSE_HEADERS.contains(&name.as_str()) {
                continue;
            }
            response_headers.append(name.clone(), value.clone());
        }

        for raw in upstream_headers.get_all(SET_COOKIE).iter() {
            if let Ok(line) = raw.to_str() {
                if let Ok(value) = HeaderValue::from_str(&cookies::sanitize_set_cookie(line)) {
                    response_headers.append(SET_COOKIE, value);
                }
            }
        }
    }

    tracing::debug!(
        client_id = %client_id,
        status = %status,
        bytes = body_bytes.len(),
        "Upstream success"
    );

    builder
        .body(Body::from(body_bytes))
        .map_err(|e| AttemptError::Connect(e.to_string()))
}

fn classify(error: &reqwest::Error) -> AttemptError {
    if error.is_timeout() {
        AttemptError::Timeout
    } else {
        AttemptError::Connect(error.to_string())
    }
}
