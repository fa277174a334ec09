//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! WebSocket session pair
//!     → connection.rs (session ids, per-side state machine)
//!
//! Per-side states:
//!     Connecting → Open → Closed
//! ```

pub mod connection;

pub use connection::{ConnectionState, SessionId, SessionState, Side};
