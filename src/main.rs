//! Gemini API reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!                     │                    PROXY                     │
//!   Client request    │  ┌────────┐   ┌────────────┐                 │
//!   ──────────────────┼─▶│ server │──▶│ dispatcher │                 │
//!                     │  └────────┘   └─────┬──────┘                 │
//!                     │        Upgrade:     │      otherwise         │
//!                     │       websocket     │                        │
//!                     │          ┌──────────┴──────────┐             │
//!                     │          ▼                     ▼             │
//!                     │  ┌──────────────┐      ┌──────────────┐      │   generativelanguage
//!                     │  │  websocket   │◀────▶│   forward    │◀─────┼──▶ .googleapis.com
//!                     │  │    relay     │      │ (HTTP, h1/h2)│      │
//!                     │  └──────────────┘      └──────────────┘      │
//!                     └──────────────────────────────────────────────┘
//! ```

use gemini_proxy::config::ProxyConfig;
use gemini_proxy::lifecycle::startup;
use gemini_proxy::observability::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    tracing::info!("gemini-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    startup::run(ProxyConfig::default()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
