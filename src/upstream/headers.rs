//! Outbound header rewrite.
//!
//! # Responsibilities
//! - Copy the whitelisted client headers onto the upstream request
//! - Pin `Origin`/`Referer` to the upstream's own origin so Django's
//!   CSRF origin check passes
//! - Attach the bridged cookie string for the resolved identity
//!
//! # Design Decisions
//! - Whitelist, not blacklist: only headers the upstream needs cross over
//! - A fresh header map is built per attempt; nothing leaks between
//!   attempts or requests

use axum::http::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, COOKIE, ORIGIN,
    REFERER, USER_AGENT,
};

/// Request headers forwarded from the client when present.
const FORWARDED_HEADERS: [HeaderName; 5] = [
    CONTENT_TYPE,
    HeaderName::from_static("x-csrftoken"),
    AUTHORIZATION,
    ACCEPT,
    USER_AGENT,
];

/// `User-Agent` sent when the client supplied none.
pub const DEFAULT_USER_AGENT: &str = concat!("omero-proxy/", env!("CARGO_PKG_VERSION"));

/// Build the outbound header set for one upstream attempt.
///
/// `cookie_header` is the bridged session string when one exists, else
/// the browser's own `Cookie` header on first contact.
pub fn build_outbound(
    inbound: &HeaderMap,
    upstream_origin: &str,
    cookie_header: Option<&str>,
) -> HeaderMap {
    let mut outbound = HeaderMap::new();

    for name in &FORWARDED_HEADERS {
        if let Some(value) = inbound.get(name) {
            outbound.insert(name.clone(), value.clone());
        }
    }

    if let Ok(referer) = HeaderValue::from_str(&format!("{}/", upstream_origin)) {
        outbound.insert(REFERER, referer);
    }
    if let Ok(origin) = HeaderValue::from_str(upstream_origin) {
        outbound.insert(ORIGIN, origin);
    }

    if !outbound.contains_key(USER_AGENT) {
        outbound.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    }

    if let Some(cookies) = cookie_header {
        if let Ok(value) = HeaderValue::from_str(cookies) {
            outbound.insert(COOKIE, value);
        }
    }

    outbound
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN_URL: &str = "https://omero.example.org";

    #[test]
    fn test_origin_and_referer_pinned_to_upstream() {
        let mut inbound = HeaderMap::new();
        inbound.insert(ORIGIN, HeaderValue::from_static("http://localhost:3000"));
        inbound.insert(REFERER, HeaderValue::from_static("http://localhost:3000/app"));

        let outbound = build_outbound(&inbound, ORIGIN_URL, None);
        assert_eq!(outbound.get(ORIGIN).unwrap(), ORIGIN_URL);
        assert_eq!(
            outbound.get(REFERER).unwrap(),
            "https://omero.example.org/"
        );
    }

    #[test]
    fn test_whitelist_copied_rest_dropped() {
        let mut inbound = HeaderMap::new();
        inbound.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        inbound.insert("x-csrftoken", HeaderValue::from_static("tok123"));
        inbound.insert("x-forwarded-for", HeaderValue::from_static("1.2.3.4"));
        inbound.insert("host", HeaderValue::from_static("localhost:3000"));

        let outbound = build_outbound(&inbound, ORIGIN_URL, None);
        assert_eq!(outbound.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(outbound.get("x-csrftoken").unwrap(), "tok123");
        assert!(outbound.get("x-forwarded-for").is_none());
        assert!(outbound.get("host").is_none());
    }

    #[test]
    fn test_default_user_agent_only_when_absent() {
        let outbound = build_outbound(&HeaderMap::new(), ORIGIN_URL, None);
        assert_eq!(outbound.get(USER_AGENT).unwrap(), DEFAULT_USER_AGENT);

        let mut inbound = HeaderMap::new();
        inbound.insert(USER_AGENT, HeaderValue::from_static("Firefox/119"));
        let outbound = build_outbound(&inbound, ORIGIN_URL, None);
        assert_eq!(outbound.get(USER_AGENT).unwrap(), "Firefox/119");
    }

    #[test]
    fn test_bridged_cookies_attached() {
        let outbound = build_outbound(
            &HeaderMap::new(),
            ORIGIN_URL,
            Some("csrftoken=tok; sessionid=sid"),
        );
        assert_eq!(outbound.get(COOKIE).unwrap(), "csrftoken=tok; sessionid=sid");

        let outbound = build_outbound(&HeaderMap::new(), ORIGIN_URL, None);
        assert!(outbound.get(COOKIE).is_none());
    }
}
