//! HTTP forwarding.
//!
//! # Responsibilities
//! - Rewrite the inbound target onto the upstream base URL
//! - Copy method, headers and body into one outbound request
//! - Stream the upstream response back untouched
//!
//! # Data Flow
//! ```text
//! inbound Request<Body>
//!     → target_url (base + path + query, no sanitization)
//!     → build_upstream_request (same method, headers, body stream)
//!     → UpstreamClient::request
//!     → response::from_upstream (status, headers, body stream)
//! ```
//!
//! # Design Decisions
//! - Bodies are never collected; memory is bounded by chunk size
//! - `Host` is the only header not copied, it is derived from the target
//! - Dropping the handler future (client gone) drops the outbound call
//! - No retries, no timeouts; any failure becomes the fixed 500

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, Uri},
    response::Response,
};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::http::error::ForwardError;
use crate::http::response;
use crate::lifecycle::startup::install_crypto_provider;

/// HTTP client used for every outbound request.
pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Build the outbound client.
///
/// Speaks TLS with webpki roots and negotiates HTTP/2 via ALPN. Plain
/// `http://` targets are allowed so a local upstream can be used in tests.
pub fn build_client() -> UpstreamClient {
    install_crypto_provider();

    let https = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .build();

    Client::builder(TokioExecutor::new()).build(https)
}

/// Path and query of an inbound URI, exactly as received.
pub fn path_and_query(uri: &Uri) -> &str {
    uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/")
}

/// Concatenate the upstream base with the inbound path and query.
pub fn target_url(base: &str, uri: &Uri) -> String {
    format!("{}{}", base, path_and_query(uri))
}

/// Headers sent upstream: every inbound header except `Host`.
pub fn forwarded_headers(mut headers: HeaderMap) -> HeaderMap {
    headers.remove(header::HOST);
    headers
}

/// Turn the inbound request into the outbound one.
///
/// The body is moved, not read; it keeps streaming from the caller.
pub fn build_upstream_request(
    base: &str,
    request: Request<Body>,
) -> Result<Request<Body>, ForwardError> {
    let (parts, body) = request.into_parts();

    let target = target_url(base, &parts.uri);
    let uri = match target.parse::<Uri>() {
        Ok(uri) => uri,
        Err(source) => return Err(ForwardError::InvalidTarget { target, source }),
    };

    let mut builder = Request::builder().method(parts.method).uri(uri);
    if let Some(headers) = builder.headers_mut() {
        *headers = forwarded_headers(parts.headers);
    }

    Ok(builder.body(body)?)
}

/// Forward one HTTP request and return whatever the upstream answered.
///
/// Never fails: forwarding errors are logged and answered with
/// `500 Proxy Error`.
pub async fn forward_http(client: &UpstreamClient, base: &str, request: Request<Body>) -> Response {
    match forward(client, base, request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "HTTP forwarding failed");
            response::proxy_error()
        }
    }
}

async fn forward(
    client: &UpstreamClient,
    base: &str,
    request: Request<Body>,
) -> Result<Response, ForwardError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none");

    tracing::info!(
        method = %request.method(),
        path = %path_and_query(request.uri()),
        content_type = %content_type,
        "Forwarding HTTP request"
    );

    let outbound = build_upstream_request(base, request)?;
    let upstream = client.request(outbound).await?;

    tracing::info!(status = upstream.status().as_u16(), "Upstream responded");

    Ok(response::from_upstream(upstream))
}
