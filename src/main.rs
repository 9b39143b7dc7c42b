//! OMERO session-bridging CORS proxy.
//!
//! A stateful reverse proxy between a browser front-end and a single
//! fixed OMERO server, built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────┐
//!                  │                 OMERO PROXY                   │
//!                  │                                               │
//!  Client Request  │  ┌────────┐   ┌──────────┐   ┌────────────┐  │
//!  ────────────────┼─▶│  http  │──▶│ session  │──▶│  upstream  │──┼──▶ OMERO
//!                  │  │ server │   │ identity │   │  pipeline  │  │    Server
//!                  │  └────────┘   │ + store  │   │ (retries)  │  │
//!                  │               └──────────┘   └─────┬──────┘  │
//!                  │                     ▲              │         │
//!  Client Response │  ┌────────┐   ┌─────┴────┐   ┌─────▼──────┐  │
//!  ◀───────────────┼──│  CORS  │◀──│  cookie  │◀──│  response  │◀─┼── OMERO
//!                  │  │ policy │   │  merge   │   │  rewrite   │  │    Response
//!                  │  └────────┘   └──────────┘   └────────────┘  │
//!                  └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use omero_proxy::config::loader::load_config;
use omero_proxy::config::ProxyConfig;
use omero_proxy::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "omero-proxy", version, about = "Session-bridging CORS proxy for OMERO")]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "omero_proxy=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("omero-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.origin,
        route_prefix = %config.upstream.route_prefix,
        insecure_skip_verify = config.upstream.insecure_skip_verify,
        retry_enabled = config.retry.enabled,
        "Configuration loaded"
    );

    if config.upstream.path_override.is_some() {
        tracing::warn!(
            path_override = config.upstream.path_override.as_deref().unwrap_or(""),
            "Path override active: every proxied call goes to one fixed upstream path"
        );
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        app = %format!("http://{}", local_addr),
        proxy_route = %format!("http://{}{}/*", local_addr, config.upstream.route_prefix),
        status = %format!("http://{}/proxy-status", local_addr),
        "Listening for connections"
    );

    let server = HttpServer::new(config)?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
