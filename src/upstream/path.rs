//! Inbound path normalization.
//!
//! # Responsibilities
//! - Strip the proxy route prefix from inbound paths
//! - Collapse a doubled `/api/api/` segment
//! - Prepend `/api` for paths outside the known upstream prefixes
//!
//! # Design Decisions
//! - Steps run in a fixed order and each step is idempotent, so the
//!   whole function is idempotent
//! - Query strings ride along untouched

/// Upstream path families that must not receive the `/api` prefix.
const KNOWN_PREFIXES: [&str; 4] = ["/api/", "/webclient/", "/webgateway/", "/static/"];

/// Normalize an inbound request path into an upstream path.
pub fn normalize(path: &str, route_prefix: &str) -> String {
    let with_slash = format!("{}/", route_prefix);

    let mut upstream_path = if let Some(rest) = path.strip_prefix(&with_slash) {
        rest.to_string()
    } else if let Some(rest) = path.strip_prefix(route_prefix) {
        rest.to_string()
    } else {
        path.to_string()
    };

    if !upstream_path.starts_with('/') {
        upstream_path.insert(0, '/');
    }

    if upstream_path.starts_with("/api/api/") {
        upstream_path = upstream_path.replacen("/api/api/", "/api/", 1);
    }

    let known = KNOWN_PREFIXES
        .iter()
        .any(|prefix| upstream_path.starts_with(prefix));
    if !known && !upstream_path.starts_with("/api") {
        upstream_path = format!("/api{}", upstream_path);
    }

    upstream_path
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "/omero-api";

    #[test]
    fn test_prefix_strip_and_api_prepend() {
        assert_eq!(normalize("/omero-api/foo", PREFIX), "/api/foo");
        assert_eq!(normalize("/omero-api/v0/m/projects/", PREFIX), "/api/v0/m/projects/");
    }

    #[test]
    fn test_known_prefixes_pass_through() {
        assert_eq!(normalize("/omero-api/webclient/x", PREFIX), "/webclient/x");
        assert_eq!(normalize("/omero-api/webgateway/img", PREFIX), "/webgateway/img");
        assert_eq!(normalize("/omero-api/static/css/a.css", PREFIX), "/static/css/a.css");
        assert_eq!(normalize("/omero-api/api/v0/token/", PREFIX), "/api/v0/token/");
    }

    #[test]
    fn test_doubled_api_collapses_once() {
        assert_eq!(normalize("/omero-api/api/api/m/x", PREFIX), "/api/m/x");
        // Only the first occurrence collapses.
        assert_eq!(
            normalize("/omero-api/api/api/api/x", PREFIX),
            "/api/api/x"
        );
    }

    #[test]
    fn test_bare_prefix() {
        assert_eq!(normalize("/omero-api", PREFIX), "/api/");
        assert_eq!(normalize("/omero-api/", PREFIX), "/api/");
    }

    #[test]
    fn test_query_string_rides_along() {
        assert_eq!(
            normalize("/omero-api/m/projects/?limit=10", PREFIX),
            "/api/m/projects/?limit=10"
        );
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let inputs = [
            "/omero-api/foo",
            "/omero-api/api/api/m/x",
            "/omero-api/webclient/x",
            "/omero-api/",
            "/omero-api/m/projects/?limit=10",
        ];
        for input in inputs {
            let once = normalize(input, PREFIX);
            let twice = normalize(&once, PREFIX);
            assert_eq!(once, twice, "not idempotent for {}", input);
        }
    }
}
