//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! compile-time constants
//!     → schema.rs (ProxyConfig defaults)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc with the forwarders
//! ```
//!
//! # Design Decisions
//! - No config file, flags or environment variables
//! - Validation returns every error, not just the first

pub mod schema;
pub mod validation;

pub use schema::ListenerConfig;
pub use schema::ProxyConfig;
pub use schema::UpstreamConfig;
pub use validation::{validate_config, ValidationError};
