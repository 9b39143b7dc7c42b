//! Session-bridging subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request headers
//!     → identity.rs (resolve per-browser key)
//!     → store.rs (look up accumulated cookies under lock)
//!     → [upstream call]
//!     → cookies.rs (extract Set-Cookie pairs, merge back into store)
//! ```
//!
//! # Design Decisions
//! - The store is the only shared mutable state in the process
//! - Cookie attributes are never stored; they are re-derived for the
//!   client-facing copy by the response rewrite

pub mod cookies;
pub mod identity;
pub mod store;

pub use store::SessionStore;
