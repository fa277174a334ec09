//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, dispatch on the Upgrade header)
//!     → forward.rs (plain HTTP: one outbound request, streamed back)
//!     → websocket.rs (upgrade: one upstream socket, frames relayed)
//!     → response.rs (upstream response or fixed 500)
//!     → Send to client
//! ```

pub mod error;
pub mod forward;
pub mod response;
pub mod server;
pub mod websocket;

pub use error::ForwardError;
pub use server::{AppState, HttpServer};
