//! Client identity resolution.
//!
//! # Responsibilities
//! - Derive a stable per-browser key from connection and header data
//! - Prefer the upstream CSRF cookie as the discriminator
//! - Fall back to a User-Agent hash when no CSRF cookie is present
//!
//! # Design Decisions
//! - Identity is a heuristic, not an authenticated identity
//! - Total function: always returns a key, never errors
//! - Collisions between browsers sharing an IP without a CSRF cookie
//!   are an accepted limitation

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::net::IpAddr;

use crate::session::cookies;

/// Resolve the identity key for one inbound request.
///
/// `{ip}_{first 8 chars of CSRF token}` when the CSRF cookie is present,
/// else `{ip}_{32-bit hash of the User-Agent}`.
pub fn resolve(
    remote_ip: IpAddr,
    cookie_header: Option<&str>,
    user_agent: Option<&str>,
    csrf_cookie_name: &str,
) -> String {
    if let Some(header) = cookie_header {
        for (name, value) in cookies::parse_pairs(header) {
            if name == csrf_cookie_name && !value.is_empty() {
                let discriminator: String = value.chars().take(8).collect();
                return format!("{}_{}", remote_ip, discriminator);
            }
        }
    }

    let user_agent = user_agent.unwrap_or("unknown");
    let mut hasher = DefaultHasher::new();
    user_agent.hash(&mut hasher);
    format!("{}_{}", remote_ip, hasher.finish() & 0xffff_ffff)
}
