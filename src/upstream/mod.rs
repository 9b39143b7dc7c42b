//! Upstream forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → path.rs (strip route prefix, collapse /api/api/, smart prefix)
//!     → headers.rs (whitelist copy, pin Origin/Referer, attach cookies)
//!     → client.rs (pooled reqwest client, per-attempt timeout)
//!     → pipeline.rs (attempt loop, cookie merge, response rewrite)
//! ```

pub mod client;
pub mod headers;
pub mod path;
pub mod pipeline;

pub use client::UpstreamClient;
