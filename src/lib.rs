//! OMERO session-bridging CORS proxy library.
//!
//! Sits between a browser front-end and a single fixed OMERO server,
//! carrying the upstream's cookie/CSRF state across the cross-origin
//! boundary on each client's behalf.

pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod upstream;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use session::SessionStore;
