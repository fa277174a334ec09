//! Configuration schema definitions.
//!
//! The proxy has a single configuration point: the upstream it forwards to.
//! Its values are compile-time constants; the structs exist so the library
//! can be pointed at a different upstream (a local mock in tests).

/// Host every request is forwarded to.
pub const UPSTREAM_HOST: &str = "generativelanguage.googleapis.com";

/// Base URL for forwarded HTTP requests.
pub const UPSTREAM_HTTP_BASE: &str = "https://generativelanguage.googleapis.com";

/// Base URL for relayed WebSocket sessions.
pub const UPSTREAM_WS_BASE: &str = "wss://generativelanguage.googleapis.com";

/// Default listening address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";

/// Root configuration for the proxy.
#[derive(Debug, Clone, Default)]
pub struct ProxyConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Upstream the proxy forwards to.
    pub upstream: UpstreamConfig,
}

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
        }
    }
}

/// Upstream base URLs.
///
/// Both are scheme + authority only. The inbound path and query are appended
/// verbatim to build the outbound target.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base for HTTP forwarding (`https://host`).
    pub http_base: String,

    /// Base for WebSocket relaying (`wss://host`).
    pub ws_base: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            http_base: UPSTREAM_HTTP_BASE.to_string(),
            ws_base: UPSTREAM_WS_BASE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_fixed_upstream() {
        let config = ProxyConfig::default();
        assert_eq!(config.upstream.http_base, format!("https://{}", UPSTREAM_HOST));
        assert_eq!(config.upstream.ws_base, format!("wss://{}", UPSTREAM_HOST));
        assert_eq!(config.listener.bind_address, "0.0.0.0:8000");
    }
}
