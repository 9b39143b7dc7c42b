//! Static file serving for the bundled front-end.
//!
//! # Responsibilities
//! - Serve files by relative path under the configured root
//! - Reject path traversal attempts
//! - Infer content types from file extensions
//!
//! # Design Decisions
//! - Thin I/O wrapper: no directory listings, no range requests
//! - `..` anywhere in the path is a hard 403, checked before any I/O

use std::path::Path;

use axum::body::Body;
use axum::http::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{Response, StatusCode};

const CACHE_POLICY: &str = "public, max-age=3600";

/// Map a request path to the relative file path to serve.
pub fn resolve_relative(request_path: &str) -> String {
    if request_path == "/" {
        "index.html".to_string()
    } else {
        request_path.trim_start_matches('/').to_string()
    }
}

/// Content type for a file, by extension.
pub fn content_type_for(file_path: &str) -> Option<&'static str> {
    if file_path.ends_with(".html") {
        Some("text/html; charset=utf-8")
    } else if file_path.ends_with(".js") {
        Some("application/javascript; charset=utf-8")
    } else if file_path.ends_with(".css") {
        Some("text/css; charset=utf-8")
    } else if file_path.ends_with(".json") {
        Some("application/json; charset=utf-8")
    } else {
        None
    }
}

/// Serve one file from `root`. CORS headers are stamped by the caller.
pub async fn serve(root: &str, request_path: &str) -> Response<Body> {
    let relative = resolve_relative(request_path);

    if relative.contains("..") {
        return status_only(StatusCode::FORBIDDEN);
    }

    let full_path = Path::new(root).join(&relative);
    let content = match tokio::fs::read(&full_path).await {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!(path = %full_path.display(), error = %e, "Static file not served");
            return status_only(StatusCode::NOT_FOUND);
        }
    };

    let mut builder = Response::builder().status(StatusCode::OK);
    if let Some(headers) = builder.headers_mut() {
        if let Some(content_type) = content_type_for(&relative) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        headers.insert(CACHE_CONTROL, HeaderValue::from_static(CACHE_POLICY));
    }

    builder
        .body(Body::from(content))
        .unwrap_or_else(|_| status_only(StatusCode::INTERNAL_SERVER_ERROR))
}

fn status_only(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_maps_to_index() {
        assert_eq!(resolve_relative("/"), "index.html");
        assert_eq!(resolve_relative("/js/app.js"), "js/app.js");
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("a.html"), Some("text/html; charset=utf-8"));
        assert_eq!(
            content_type_for("js/app.js"),
            Some("application/javascript; charset=utf-8")
        );
        assert_eq!(content_type_for("style.css"), Some("text/css; charset=utf-8"));
        assert_eq!(
            content_type_for("data.json"),
            Some("application/json; charset=utf-8")
        );
        assert_eq!(content_type_for("image.png"), None);
    }

    #[tokio::test]
    async fn test_traversal_is_forbidden() {
        let response = serve(".", "/../etc/passwd").await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = serve(".", "/js/../../secret").await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let response = serve("/nonexistent-root", "/missing.html").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serves_file_with_cache_header() {
        let dir = std::env::temp_dir().join("omero-proxy-statics-test");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("index.html"), b"<html></html>")
            .await
            .unwrap();

        let response = serve(dir.to_str().unwrap(), "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CACHE_CONTROL).unwrap(),
            CACHE_POLICY
        );
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
    }
}
