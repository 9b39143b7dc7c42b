//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use omero_proxy::config::ProxyConfig;
use omero_proxy::HttpServer;

/// Canned response served by the mock upstream.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

#[allow(dead_code)]
impl MockResponse {
    pub fn ok(body: &str) -> Self {
        Self {
            status: 200,
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: body.to_string(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: body.to_string(),
        }
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        403 => "Forbidden",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

/// Start a programmable mock upstream on an ephemeral port.
///
/// The handler receives the raw request head (request line + headers,
/// lowercased) and returns the response to serve.
pub async fn start_mock_upstream<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MockResponse> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buffer = Vec::new();
                        let mut chunk = [0u8; 4096];
                        let head_end = loop {
                            match socket.read(&mut chunk).await {
                                Ok(0) => return,
                                Ok(n) => {
                                    buffer.extend_from_slice(&chunk[..n]);
                                    if let Some(pos) =
                                        buffer.windows(4).position(|w| w == b"\r\n\r\n")
                                    {
                                        break pos + 4;
                                    }
                                }
                                Err(_) => return,
                            }
                        };

                        let head =
                            String::from_utf8_lossy(&buffer[..head_end]).to_lowercase();

                        // Drain any body the client announced.
                        let content_length = head
                            .lines()
                            .find_map(|line| line.strip_prefix("content-length:"))
                            .and_then(|v| v.trim().parse::<usize>().ok())
                            .unwrap_or(0);
                        while buffer.len() < head_end + content_length {
                            match socket.read(&mut chunk).await {
                                Ok(0) => break,
                                Ok(n) => buffer.extend_from_slice(&chunk[..n]),
                                Err(_) => return,
                            }
                        }

                        let response = f(head).await;
                        let mut wire = format!(
                            "HTTP/1.1 {} {}\r\n",
                            response.status,
                            reason_phrase(response.status)
                        );
                        for (name, value) in &response.headers {
                            wire.push_str(&format!("{}: {}\r\n", name, value));
                        }
                        wire.push_str(&format!(
                            "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                            response.body.len(),
                            response.body
                        ));

                        let _ = socket.write_all(wire.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Config pointing at a mock upstream, with test-friendly retry delays.
pub fn test_config(upstream_addr: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.upstream.origin = format!("http://{}", upstream_addr);
    config.upstream.insecure_skip_verify = false;
    config.retry.delay_between_attempts_ms = 10;
    config.static_files.enabled = false;
    config
}

/// Spawn the proxy on an ephemeral port and return its address.
pub async fn spawn_proxy(config: ProxyConfig) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();

    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });

    addr
}

/// Client that never pools connections across tests or follows redirects.
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
