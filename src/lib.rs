//! Gemini API reverse proxy library.
//!
//! Forwards HTTP and WebSocket traffic, unmodified, to
//! `generativelanguage.googleapis.com`.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
