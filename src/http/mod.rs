//! HTTP surface subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, method/route dispatch)
//!     → request.rs (request ID stamping)
//!     → [session + upstream pipeline for {prefix}/*]
//!     → cors.rs (access-control headers on every exit path)
//!     → status.rs / statics.rs (diagnostics and front-end assets)
//! ```

pub mod cors;
pub mod request;
pub mod server;
pub mod statics;
pub mod status;

pub use request::{RequestIdLayer, X_REQUEST_ID};
pub use server::HttpServer;
