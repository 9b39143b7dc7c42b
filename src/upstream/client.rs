//! Upstream HTTP client.
//!
//! # Responsibilities
//! - Build one pooled client at startup from config
//! - Apply the per-attempt timeout on each request
//! - Surface transport errors untouched for the pipeline to classify
//!
//! # Design Decisions
//! - Certificate validation bypass is driven by the explicit
//!   `insecure_skip_verify` flag, never hardcoded
//! - The client holds no cookie jar; cookie state lives in the
//!   session store and travels as explicit headers

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};

use crate::config::UpstreamConfig;

/// Pooled client for the single fixed upstream.
pub struct UpstreamClient {
    http: reqwest::Client,
    origin: String,
}

impl UpstreamClient {
    /// Build the client from config. Called once at startup.
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .pool_max_idle_per_host(8)
            .pool_idle_timeout(Duration::from_secs(90))
            .no_proxy()
            .build()?;

        Ok(Self {
            http,
            origin: config.origin.clone(),
        })
    }

    /// The fixed upstream origin this client talks to.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Send one attempt. The timeout bounds the whole attempt including
    /// the response body.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Option<Bytes>,
        timeout: Duration,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let mut request = self
            .http
            .request(method, url)
            .headers(headers)
            .timeout(timeout);

        if let Some(bytes) = body {
            request = request.body(bytes);
        }

        request.send().await
    }
}
