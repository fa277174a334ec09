//! Observability subsystem.
//!
//! Human-readable diagnostic lines only: every subsystem logs through
//! `tracing`, and `logging.rs` installs the subscriber that prints them.

pub mod logging;
