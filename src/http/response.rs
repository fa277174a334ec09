//! Response construction.
//!
//! # Responsibilities
//! - Hand the upstream response back with status, headers and body untouched
//! - Produce the fixed error responses
//!
//! # Design Decisions
//! - Upstream body is wrapped, never collected: bytes flow as they arrive
//! - Error bodies are fixed strings; the cause only goes to the log

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use hyper::body::Incoming;

/// Body returned when HTTP forwarding fails.
pub const PROXY_ERROR_BODY: &str = "Proxy Error";

/// Body returned when a WebSocket relay cannot be set up.
pub const WEBSOCKET_ERROR_BODY: &str = "WebSocket Error";

/// Convert an upstream response into the response for the caller.
pub fn from_upstream(response: hyper::Response<Incoming>) -> Response {
    let (parts, body) = response.into_parts();
    Response::from_parts(parts, Body::new(body))
}

/// Fixed 500 for HTTP forwarding failures.
pub fn proxy_error() -> Response {
    fixed_error(PROXY_ERROR_BODY)
}

/// Fixed 500 for WebSocket setup failures.
pub fn websocket_error() -> Response {
    fixed_error(WEBSOCKET_ERROR_BODY)
}

fn fixed_error(body: &'static str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        )],
        body,
    )
        .into_response()
}
