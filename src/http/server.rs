//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum Router with the catch-all proxy handler
//! - Wire up middleware (tracing)
//! - Bind server to listener and serve until shutdown
//! - Dispatch each request to the HTTP or WebSocket forwarder

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{ProxyConfig, UpstreamConfig};
use crate::http::forward::{self, path_and_query, UpstreamClient};
use crate::http::websocket;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: UpstreamClient,
    pub upstream: Arc<UpstreamConfig>,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let state = AppState {
            client: forward::build_client(),
            upstream: Arc::new(config.upstream.clone()),
        };

        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router. Every method and path reaches the dispatcher.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
    }

    /// The router, for serving it on a custom listener or driving it in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until the shutdown receiver fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            http_upstream = %self.config.upstream.http_base,
            ws_upstream = %self.config.upstream.ws_base,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// True when the `Upgrade` header asks for a WebSocket.
pub fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    headers
        .get(header::UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"))
}

/// Entry point for every request: pick a forwarder and hand the request over.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("proxy", request_id = %request_id);

    async move {
        if is_websocket_upgrade(request.headers()) {
            tracing::info!(path = %path_and_query(request.uri()), "Dispatching WebSocket upgrade");
            websocket::forward_websocket(&state.upstream.ws_base, request).await
        } else {
            tracing::info!(
                method = %request.method(),
                path = %path_and_query(request.uri()),
                "Dispatching HTTP request"
            );
            forward::forward_http(&state.client, &state.upstream.http_base, request).await
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use tower::ServiceExt;

    fn unreachable_config() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.upstream.http_base = "http://127.0.0.1:1".into();
        config.upstream.ws_base = "ws://127.0.0.1:1".into();
        config
    }

    #[test]
    fn upgrade_header_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        assert!(!is_websocket_upgrade(&headers));

        headers.insert(header::UPGRADE, HeaderValue::from_static("WebSocket"));
        assert!(is_websocket_upgrade(&headers));

        headers.insert(header::UPGRADE, HeaderValue::from_static("websocket"));
        assert!(is_websocket_upgrade(&headers));
    }

    #[test]
    fn other_upgrades_go_to_http() {
        let mut headers = HeaderMap::new();
        headers.insert(header::UPGRADE, HeaderValue::from_static("h2c"));
        assert!(!is_websocket_upgrade(&headers));

        headers.insert(header::UPGRADE, HeaderValue::from_static("websocket, h2c"));
        assert!(!is_websocket_upgrade(&headers));
    }

    #[tokio::test]
    async fn http_failure_maps_to_proxy_error() {
        let server = HttpServer::new(unreachable_config());
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1beta/models?key=ABC")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Proxy Error");
    }

    #[tokio::test]
    async fn websocket_failure_maps_to_websocket_error() {
        let server = HttpServer::new(unreachable_config());
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/ws/live")
                    .header(header::UPGRADE, "WEBSOCKET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"WebSocket Error");
    }
}
