//! Shared utilities for integration testing: mock upstreams and a proxy
//! pointed at them.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use futures_util::StreamExt;
use gemini_proxy::config::{ProxyConfig, UpstreamConfig};
use gemini_proxy::http::HttpServer;
use gemini_proxy::lifecycle::Shutdown;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::handshake::server::{ErrorResponse, Request as WsRequest, Response as WsResponse},
    WebSocketStream,
};

pub const WAIT: Duration = Duration::from_secs(5);

/// A request as the mock upstream saw it.
#[derive(Debug)]
pub struct Recorded {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// A proxy running on an ephemeral port.
pub struct TestProxy {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the proxy forwarding to the given upstream.
pub async fn start_proxy(upstream: UpstreamConfig) -> TestProxy {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream = upstream;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestProxy { addr, shutdown }
}

/// Upstream config pointing both protocols at one local address.
pub fn local_upstream(addr: SocketAddr) -> UpstreamConfig {
    UpstreamConfig {
        http_base: format!("http://{}", addr),
        ws_base: format!("ws://{}", addr),
    }
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Serve a router on an ephemeral port.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Mock HTTP upstream that records every request and answers:
/// - `/status/{code}`: that status, body `upstream {code}`
/// - `/echo...`: the request body back
/// - anything else: 200 with a small JSON body
pub async fn start_recording_upstream() -> (SocketAddr, mpsc::UnboundedReceiver<Recorded>) {
    let (tx, rx) = mpsc::unbounded_channel();

    let router = Router::new().fallback(move |request: Request<Body>| {
        let tx = tx.clone();
        async move {
            let (parts, body) = request.into_parts();
            let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
            let path = parts.uri.path().to_string();

            let _ = tx.send(Recorded {
                method: parts.method,
                uri: parts.uri.to_string(),
                headers: parts.headers,
                body: body.clone(),
            });

            respond(&path, body)
        }
    });

    (serve(router).await, rx)
}

fn respond(path: &str, body: Bytes) -> Response {
    if let Some(code) = path.strip_prefix("/status/") {
        let status = code
            .parse::<u16>()
            .ok()
            .and_then(|c| StatusCode::from_u16(c).ok())
            .unwrap_or(StatusCode::BAD_REQUEST);
        return (
            status,
            [("x-upstream", "mock"), ("content-type", "text/plain")],
            format!("upstream {}", code),
        )
            .into_response();
    }

    if path.starts_with("/echo") {
        return (
            [("x-upstream", "mock"), ("content-type", "application/octet-stream")],
            body,
        )
            .into_response();
    }

    (
        [("x-upstream", "mock"), ("content-type", "application/json")],
        r#"{"candidates":[]}"#,
    )
        .into_response()
}

/// One WebSocket connection accepted by the mock upstream.
pub struct UpstreamSession {
    pub path: String,
    pub socket: WebSocketStream<TcpStream>,
}

/// Mock WebSocket upstream handing every accepted connection to the test.
pub async fn start_ws_upstream() -> (SocketAddr, mpsc::UnboundedReceiver<UpstreamSession>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut path = String::new();
                let accepted = accept_hdr_async(
                    stream,
                    |req: &WsRequest, resp: WsResponse| -> Result<WsResponse, ErrorResponse> {
                        path = req.uri().to_string();
                        Ok(resp)
                    },
                )
                .await;
                if let Ok(socket) = accepted {
                    let _ = tx.send(UpstreamSession { path, socket });
                }
            });
        }
    });

    (addr, rx)
}

/// Next data or close message on a tungstenite stream, skipping ping/pong.
pub async fn next_message<S>(
    socket: &mut WebSocketStream<S>,
) -> Option<tokio_tungstenite::tungstenite::Message>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    use tokio_tungstenite::tungstenite::Message;

    loop {
        match tokio::time::timeout(WAIT, socket.next()).await {
            Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => continue,
            Ok(Some(Ok(msg))) => return Some(msg),
            Ok(Some(Err(_))) | Ok(None) => return None,
            Err(_) => panic!("timed out waiting for a websocket message"),
        }
    }
}
