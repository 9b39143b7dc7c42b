//! Cross-origin response policy.
//!
//! # Responsibilities
//! - Stamp every response (success, error, preflight) with the
//!   access-control headers the browser front-end needs
//! - Echo the caller's `Origin` so credentialed requests work
//!
//! # Design Decisions
//! - Credentials mode forbids a wildcard origin, hence the echo
//! - One function applied uniformly on every exit path; no response
//!   leaves the proxy without these headers

use axum::http::header::{HeaderMap, HeaderValue};

pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, PATCH, OPTIONS";
pub const ALLOW_HEADERS: &str =
    "Content-Type, Authorization, X-CSRFToken, Referer, Accept, Cookie";
pub const EXPOSE_HEADERS: &str = "Set-Cookie, Content-Type, Content-Length";

/// Apply the CORS header set to a response.
///
/// `request_origin` is the inbound `Origin` header; `default_origin` is
/// echoed when the request carried none.
pub fn apply(headers: &mut HeaderMap, request_origin: Option<&HeaderValue>, default_origin: &str) {
    let origin = request_origin.cloned().unwrap_or_else(|| {
        HeaderValue::from_str(default_origin)
            .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3000"))
    });

    headers.insert("access-control-allow-origin", origin);
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        "access-control-allow-credentials",
        HeaderValue::from_static("true"),
    );
    headers.insert(
        "access-control-expose-headers",
        HeaderValue::from_static(EXPOSE_HEADERS),
    );
}
