//! Forwarding failures.
//!
//! Only two kinds are distinguished at the surface (HTTP and WebSocket); the
//! variants below keep the underlying cause for the log line.

use axum::extract::ws::rejection::WebSocketUpgradeRejection;

/// Failure while forwarding a request or setting up a relay.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    /// Base + path + query did not form a valid URI.
    #[error("invalid upstream target `{target}`: {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: axum::http::uri::InvalidUri,
    },

    /// Outbound request could not be assembled.
    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    /// Connect, DNS, TLS or I/O failure talking to the upstream.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    /// Inbound upgrade request was not a valid WebSocket handshake.
    #[error("invalid websocket upgrade: {0}")]
    Upgrade(#[from] WebSocketUpgradeRejection),

    /// Upstream WebSocket connect or handshake failed.
    #[error("upstream websocket failed: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}
