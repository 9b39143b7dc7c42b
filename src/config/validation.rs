//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (attempts >= 1, timeouts > 0)
//! - Check the upstream origin is an absolute http(s) URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig -> Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("invalid upstream origin '{0}': {1}")]
    InvalidUpstreamOrigin(String, String),

    #[error("upstream origin '{0}' must use http or https")]
    UnsupportedScheme(String),

    #[error("route prefix '{0}' must start with '/' and not end with '/'")]
    InvalidRoutePrefix(String),

    #[error("retry.max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("retry.base_timeout_secs must be at least 1")]
    ZeroTimeout,

    #[error("csrf_cookie_name must not be empty")]
    EmptyCsrfCookieName,
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    match Url::parse(&config.upstream.origin) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                errors.push(ValidationError::UnsupportedScheme(
                    config.upstream.origin.clone(),
                ));
            }
        }
        Err(e) => {
            errors.push(ValidationError::InvalidUpstreamOrigin(
                config.upstream.origin.clone(),
                e.to_string(),
            ));
        }
    }

    let prefix = &config.upstream.route_prefix;
    if !prefix.starts_with('/') || (prefix.len() > 1 && prefix.ends_with('/')) {
        errors.push(ValidationError::InvalidRoutePrefix(prefix.clone()));
    }

    if config.retry.max_attempts == 0 {
        errors.push(ValidationError::ZeroAttempts);
    }

    if config.retry.base_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.upstream.csrf_cookie_name.is_empty() {
        errors.push(ValidationError::EmptyCsrfCookieName);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ProxyConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.upstream.origin = "ftp://example.com".into();
        config.retry.max_attempts = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::ZeroAttempts));
    }

    #[test]
    fn test_route_prefix_shape() {
        let mut config = ProxyConfig::default();
        config.upstream.route_prefix = "omero-api".into();
        assert!(validate_config(&config).is_err());

        config.upstream.route_prefix = "/omero-api/".into();
        assert!(validate_config(&config).is_err());

        config.upstream.route_prefix = "/omero-api".into();
        assert!(validate_config(&config).is_ok());
    }
}
