//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the session-bridging proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Fixed upstream server settings.
    pub upstream: UpstreamConfig,

    /// Retry and timeout policy for upstream calls.
    pub retry: RetryConfig,

    /// Session store settings.
    pub session: SessionConfig,

    /// Static file serving for the bundled front-end.
    pub static_files: StaticFilesConfig,

    /// Cross-origin response policy.
    pub cors: CorsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Upstream server configuration.
///
/// The proxy talks to exactly one fixed origin; there is no backend pool.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream origin, scheme included, no trailing slash
    /// (e.g., "https://omero-imaging.uni-muenster.de").
    pub origin: String,

    /// Skip TLS certificate validation for the upstream.
    ///
    /// The reference deployment proxies to a server with an untrusted
    /// certificate. This trade-off must stay visible in config, never
    /// become a silent default inside the client.
    pub insecure_skip_verify: bool,

    /// Name of the upstream's CSRF cookie (Django default: "csrftoken").
    pub csrf_cookie_name: String,

    /// Route prefix under which proxied calls arrive (no trailing slash).
    pub route_prefix: String,

    /// Debugging profile: when set, every proxied call is sent to this
    /// fixed upstream path instead of the normalized request path.
    pub path_override: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            origin: "https://omero-imaging.uni-muenster.de".to_string(),
            insecure_skip_verify: true,
            csrf_cookie_name: "csrftoken".to_string(),
            route_prefix: "/omero-api".to_string(),
            path_override: None,
        }
    }
}

/// Retry configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries. When disabled every request gets a single attempt.
    pub enabled: bool,

    /// Maximum number of attempts per request.
    pub max_attempts: u32,

    /// Timeout for the first attempt in seconds.
    pub base_timeout_secs: u64,

    /// Added to the timeout for each subsequent attempt in seconds.
    pub timeout_step_secs: u64,

    /// Delay between attempts in milliseconds.
    pub delay_between_attempts_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            base_timeout_secs: 15,
            timeout_step_secs: 5,
            delay_between_attempts_ms: 1000,
        }
    }
}

impl RetryConfig {
    /// Effective number of attempts for one request.
    pub fn attempt_budget(&self) -> u32 {
        if self.enabled {
            self.max_attempts.max(1)
        } else {
            1
        }
    }

    /// Progressive timeout for a zero-based attempt index (15s, 20s, 25s
    /// with the defaults).
    pub fn timeout_for_attempt(&self, attempt: u32) -> Duration {
        Duration::from_secs(
            self.base_timeout_secs
                .saturating_add(self.timeout_step_secs.saturating_mul(u64::from(attempt))),
        )
    }

    /// Delay slept between attempts.
    pub fn delay_between_attempts(&self) -> Duration {
        Duration::from_millis(self.delay_between_attempts_ms)
    }

    /// Upper bound on the wall-clock time one request can spend in the
    /// attempt loop, used for the outer request timeout layer.
    pub fn request_deadline(&self) -> Duration {
        let budget = self.attempt_budget();
        let mut total = Duration::ZERO;
        for attempt in 0..budget {
            total += self.timeout_for_attempt(attempt);
        }
        total += self.delay_between_attempts() * budget.saturating_sub(1);
        // Headroom for response body transfer and scheduling.
        total + Duration::from_secs(5)
    }
}

/// Session store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SessionConfig {
    /// Entry time-to-live in seconds. `None` keeps entries for the
    /// lifetime of the process (the reference behavior).
    pub ttl_secs: Option<u64>,
}

/// Static file serving configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Serve local files for non-proxy GET requests.
    pub enabled: bool,

    /// Directory files are served from.
    pub root: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            root: ".".to_string(),
        }
    }
}

/// CORS response configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origin echoed back when the request carries no `Origin` header.
    pub default_origin: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            default_origin: "http://localhost:3000".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progressive_timeouts() {
        let retry = RetryConfig::default();
        assert_eq!(retry.timeout_for_attempt(0), Duration::from_secs(15));
        assert_eq!(retry.timeout_for_attempt(1), Duration::from_secs(20));
        assert_eq!(retry.timeout_for_attempt(2), Duration::from_secs(25));
    }

    #[test]
    fn test_attempt_budget_respects_enabled_flag() {
        let mut retry = RetryConfig::default();
        assert_eq!(retry.attempt_budget(), 3);

        retry.enabled = false;
        assert_eq!(retry.attempt_budget(), 1);

        retry.enabled = true;
        retry.max_attempts = 0;
        assert_eq!(retry.attempt_budget(), 1);
    }

    #[test]
    fn test_request_deadline_covers_all_attempts() {
        let retry = RetryConfig::default();
        // 15 + 20 + 25 + 2 * 1s delay + headroom
        assert!(retry.request_deadline() >= Duration::from_secs(62));
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: ProxyConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:3000");
        assert_eq!(config.upstream.csrf_cookie_name, "csrftoken");
        assert!(config.upstream.path_override.is_none());
        assert!(config.retry.enabled);
    }
}
