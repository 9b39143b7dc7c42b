//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router and wire up middleware (tracing, timeout,
//!   request ID)
//! - Resolve client identity and dispatch proxied requests into the
//!   upstream pipeline
//! - Serve the preflight, diagnostics, and static file surfaces
//! - Stamp the CORS policy on every exit path

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Method, Request, Response, StatusCode},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::request::RequestIdLayer;
use crate::http::{cors, statics, status::ProxyStatus};
use crate::session::{identity, SessionStore};
use crate::upstream::{pipeline, UpstreamClient};

/// Largest request body buffered for forwarding.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Application state injected into handlers.
///
/// One service object constructed at startup; handlers share it by
/// reference, nothing lives in statics.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub store: Arc<SessionStore>,
    pub upstream: Arc<UpstreamClient>,
}

/// HTTP server for the session-bridging proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let store = Arc::new(SessionStore::new(
            config.session.ttl_secs.map(Duration::from_secs),
        ));
        let upstream = Arc::new(UpstreamClient::new(&config.upstream)?);

        let state = AppState {
            config: Arc::new(config.clone()),
            store,
            upstream,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let prefix = &config.upstream.route_prefix;

        Router::new()
            .route("/proxy-status", any(status_handler))
            .route(prefix, any(proxy_handler))
            .route(&format!("{}/{{*path}}", prefix), any(proxy_handler))
            .fallback(fallback_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(config.retry.request_deadline()))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.origin,
            route_prefix = %self.config.upstream.route_prefix,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Proxied API surface: `GET/POST/PATCH {prefix}/*`.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response<Body> {
    let origin = request.headers().get(header::ORIGIN).cloned();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = if method == Method::OPTIONS {
        empty_response(StatusCode::OK)
    } else if method == Method::GET || method == Method::POST || method == Method::PATCH {
        match handle_proxy(&state, addr, request).await {
            Ok(response) => response,
            Err(error) => {
                tracing::error!(path = %path, error = %error, "Proxied request failed");
                error.into_response()
            }
        }
    } else {
        empty_response(StatusCode::NOT_FOUND)
    };

    cors::apply(
        response.headers_mut(),
        origin.as_ref(),
        &state.config.cors.default_origin,
    );
    response
}

/// Resolve identity, buffer the body, and run the pipeline.
async fn handle_proxy(
    state: &AppState,
    addr: SocketAddr,
    request: Request<Body>,
) -> Result<Response<Body>, ProxyError> {
    let (parts, body) = request.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());

    let cookie_header = parts
        .headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok());
    let user_agent = parts
        .headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok());

    let client_id = identity::resolve(
        addr.ip(),
        cookie_header,
        user_agent,
        &state.config.upstream.csrf_cookie_name,
    );

    let body_bytes = if parts.method == Method::POST || parts.method == Method::PATCH {
        let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| ProxyError::Internal {
                path: path_and_query.clone(),
                message: e.to_string(),
            })?;
        Some(bytes)
    } else {
        None
    };

    pipeline::forward(
        &state.upstream,
        &state.store,
        &state.config.retry,
        &state.config.upstream,
        &client_id,
        parts.method.clone(),
        &path_and_query,
        &parts.headers,
        body_bytes,
    )
    .await
}

/// Diagnostics surface: `GET /proxy-status`.
async fn status_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Response<Body> {
    let origin = request.headers().get(header::ORIGIN).cloned();
    let method = request.method().clone();

    let mut response = if method == Method::OPTIONS {
        empty_response(StatusCode::OK)
    } else if method == Method::GET {
        let status = ProxyStatus::collect(state.upstream.origin(), &state.store);
        match serde_json::to_string_pretty(&status) {
            Ok(body) => {
                let mut response = Response::new(Body::from(body));
                response.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                response
            }
            Err(e) => ProxyError::Internal {
                path: "/proxy-status".to_string(),
                message: e.to_string(),
            }
            .into_response(),
        }
    } else {
        empty_response(StatusCode::NOT_FOUND)
    };

    cors::apply(
        response.headers_mut(),
        origin.as_ref(),
        &state.config.cors.default_origin,
    );
    response
}

/// Everything outside the proxy prefix: preflight, static files, 404.
async fn fallback_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Response<Body> {
    let origin = request.headers().get(header::ORIGIN).cloned();
    let method = request.method().clone();

    let mut response = if method == Method::OPTIONS {
        empty_response(StatusCode::OK)
    } else if method == Method::GET && state.config.static_files.enabled {
        statics::serve(&state.config.static_files.root, request.uri().path()).await
    } else {
        empty_response(StatusCode::NOT_FOUND)
    };

    cors::apply(
        response.headers_mut(),
        origin.as_ref(),
        &state.config.cors.default_origin,
    );
    response
}

fn empty_response(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("Failed to install Ctrl+C handler");
    }
    tracing::info!("Shutdown signal received");
}
