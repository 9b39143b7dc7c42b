//! Proxy status diagnostics.
//!
//! Read-only view of the session store for front-end debugging; cookie
//! values are truncated so the endpoint never leaks full session state.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::session::SessionStore;

const PREVIEW_LEN: usize = 30;

/// Diagnostic snapshot returned by `GET /proxy-status`.
#[derive(Debug, Serialize)]
pub struct ProxyStatus {
    pub proxy_running: bool,
    pub omero_server: String,
    pub active_sessions: usize,
    pub connection_pool_initialized: bool,
    pub session_details: BTreeMap<String, String>,
}

impl ProxyStatus {
    pub fn collect(upstream_origin: &str, store: &SessionStore) -> Self {
        let session_details = store
            .snapshot()
            .into_iter()
            .map(|(identity, cookies)| (identity, preview(&cookies)))
            .collect();

        Self {
            proxy_running: true,
            omero_server: upstream_origin.to_string(),
            active_sessions: store.len(),
            connection_pool_initialized: true,
            session_details,
        }
    }
}

fn preview(cookies: &str) -> String {
    if cookies.chars().count() > PREVIEW_LEN {
        let truncated: String = cookies.chars().take(PREVIEW_LEN).collect();
        format!("{}...", truncated)
    } else {
        cookies.to_string()
    }
}
