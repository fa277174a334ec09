//! WebSocket proxy handling.
//!
//! # Responsibilities
//! - Validate the inbound upgrade request
//! - Establish the WebSocket connection to the upstream
//! - Complete the upgrade with the client
//! - Relay frames in both directions until either side closes
//!
//! # Data Flow
//! ```text
//! Client ←──── WebSocket frames ────→ Proxy ←──── WebSocket frames ────→ Upstream
//! ```
//!
//! # Design Decisions
//! - Upstream is connected before the client gets its 101, so a failed
//!   upstream still gets a plain 500 back
//! - One event loop per session polls both sides; frames from one side are
//!   relayed in arrival order
//! - Text/binary framing is preserved, ping/pong is answered per hop
//! - Payloads move between the two libraries as shared `Bytes`, never copied
//! - First close on either side closes the other, forwarding the close code;
//!   the loop exits on that close, so no frame is ever sent to a closed side

use axum::{
    body::{Body, Bytes},
    extract::{
        ws::{self, WebSocket, WebSocketUpgrade},
        FromRequestParts,
    },
    http::Request,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::str::Utf8Error;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        self,
        protocol::{frame::coding::CloseCode, CloseFrame},
    },
    MaybeTlsStream, WebSocketStream,
};

use crate::http::error::ForwardError;
use crate::http::forward::{path_and_query, target_url};
use crate::http::response;
use crate::net::{ConnectionState, SessionId, SessionState, Side};

type UpstreamSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A relayed message, independent of which WebSocket library produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Payload of a text message, UTF-8 checked by the receiving socket.
    Text(Bytes),
    Binary(Bytes),
}

/// Close code and reason carried by a close frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    pub code: u16,
    pub reason: String,
}

/// What one read from a side of the session produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Data frame to relay to the peer.
    Data(Frame),
    /// Side is gone: close frame, end of stream or error.
    Closed(Option<CloseInfo>),
    /// Control frame handled by the WebSocket implementation.
    Ignored,
}

impl Event {
    /// Classify a read from the client socket.
    pub fn from_client(msg: Option<Result<ws::Message, axum::Error>>) -> Self {
        match msg {
            Some(Ok(ws::Message::Text(text))) => Event::Data(Frame::Text(Bytes::from(text))),
            Some(Ok(ws::Message::Binary(data))) => Event::Data(Frame::Binary(data)),
            Some(Ok(ws::Message::Ping(_) | ws::Message::Pong(_))) => Event::Ignored,
            Some(Ok(ws::Message::Close(frame))) => Event::Closed(frame.map(|f| CloseInfo {
                code: f.code,
                reason: f.reason.as_str().to_owned(),
            })),
            Some(Err(e)) => {
                tracing::debug!(error = %e, "Client socket error");
                Event::Closed(None)
            }
            None => Event::Closed(None),
        }
    }

    /// Classify a read from the upstream socket.
    pub fn from_upstream(msg: Option<Result<tungstenite::Message, tungstenite::Error>>) -> Self {
        match msg {
            Some(Ok(tungstenite::Message::Text(text))) => {
                Event::Data(Frame::Text(Bytes::from(text)))
            }
            Some(Ok(tungstenite::Message::Binary(data))) => Event::Data(Frame::Binary(data)),
            Some(Ok(
                tungstenite::Message::Ping(_)
                | tungstenite::Message::Pong(_)
                | tungstenite::Message::Frame(_),
            )) => Event::Ignored,
            Some(Ok(tungstenite::Message::Close(frame))) => Event::Closed(frame.map(|f| CloseInfo {
                code: u16::from(f.code),
                reason: f.reason.as_str().to_owned(),
            })),
            Some(Err(e)) => {
                tracing::debug!(error = %e, "Upstream socket error");
                Event::Closed(None)
            }
            None => Event::Closed(None),
        }
    }
}

impl Frame {
    /// Only fails if a text payload is not UTF-8, which the receiving
    /// socket already rules out.
    pub fn into_client(self) -> Result<ws::Message, Utf8Error> {
        Ok(match self {
            Frame::Text(text) => ws::Message::Text(ws::Utf8Bytes::try_from(text)?),
            Frame::Binary(data) => ws::Message::Binary(data),
        })
    }

    pub fn into_upstream(self) -> Result<tungstenite::Message, Utf8Error> {
        Ok(match self {
            Frame::Text(text) => {
                tungstenite::Message::Text(tungstenite::Utf8Bytes::try_from(text)?)
            }
            Frame::Binary(data) => tungstenite::Message::Binary(data),
        })
    }
}

impl CloseInfo {
    pub fn into_client(self) -> ws::CloseFrame {
        ws::CloseFrame {
            code: self.code,
            reason: self.reason.into(),
        }
    }

    pub fn into_upstream(self) -> CloseFrame {
        CloseFrame {
            code: CloseCode::from(self.code),
            reason: self.reason.into(),
        }
    }
}

/// Forward one WebSocket upgrade request.
///
/// Never fails: setup errors are logged and answered with
/// `500 WebSocket Error`.
pub async fn forward_websocket(ws_base: &str, request: Request<Body>) -> Response {
    match setup(ws_base, request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "WebSocket forwarding failed");
            response::websocket_error()
        }
    }
}

async fn setup(ws_base: &str, request: Request<Body>) -> Result<Response, ForwardError> {
    let (mut parts, _body) = request.into_parts();
    let session = SessionId::new();
    let target = target_url(ws_base, &parts.uri);

    tracing::info!(
        session = %session,
        path = %path_and_query(&parts.uri),
        "Forwarding WebSocket session"
    );

    let upgrade: WebSocketUpgrade = WebSocketUpgrade::from_request_parts(&mut parts, &()).await?;

    let (upstream, handshake) = connect_async(target.as_str()).await?;
    tracing::debug!(
        session = %session,
        status = handshake.status().as_u16(),
        "Upstream WebSocket connected"
    );

    Ok(upgrade
        .on_failed_upgrade(move |e| {
            tracing::error!(session = %session, error = %e, "Client upgrade failed");
        })
        .on_upgrade(move |client| relay(session, client, upstream)))
}

/// Relay frames between the two sockets until one of them closes, then
/// close the other.
async fn relay(session: SessionId, client: WebSocket, upstream: UpstreamSocket) {
    let mut state = SessionState::new(session);
    state.open(Side::Upstream);
    state.open(Side::Client);

    let (mut client_tx, mut client_rx) = client.split();
    let (mut upstream_tx, mut upstream_rx) = upstream.split();

    let (closed_by, close) = loop {
        let (side, event) = tokio::select! {
            msg = client_rx.next() => (Side::Client, Event::from_client(msg)),
            msg = upstream_rx.next() => (Side::Upstream, Event::from_upstream(msg)),
        };

        match event {
            Event::Data(frame) => {
                let sent = match side.peer() {
                    Side::Upstream => match frame.into_upstream() {
                        Ok(msg) => upstream_tx.send(msg).await.is_ok(),
                        Err(e) => {
                            tracing::debug!(session = %session, error = %e, "Invalid text frame");
                            false
                        }
                    },
                    Side::Client => match frame.into_client() {
                        Ok(msg) => client_tx.send(msg).await.is_ok(),
                        Err(e) => {
                            tracing::debug!(session = %session, error = %e, "Invalid text frame");
                            false
                        }
                    },
                };
                if !sent {
                    state.close(side.peer());
                    break (side.peer(), None);
                }
            }
            Event::Closed(close) => {
                state.close(side);
                break (side, close);
            }
            Event::Ignored => {}
        }
    };

    tracing::info!(
        session = %session,
        closed_by = %closed_by,
        code = close.as_ref().map(|c| c.code),
        "WebSocket session closing"
    );

    // The side that closed first only needs its handshake flushed; the other
    // side gets the close frame forwarded to it.
    if state.get(Side::Upstream) == ConnectionState::Open {
        let frame = close.clone().map(CloseInfo::into_upstream);
        let _ = upstream_tx.send(tungstenite::Message::Close(frame)).await;
    }
    if state.get(Side::Client) == ConnectionState::Open {
        let frame = close.map(CloseInfo::into_client);
        let _ = client_tx.send(ws::Message::Close(frame)).await;
    }
    let _ = upstream_tx.close().await;
    let _ = client_tx.close().await;
    state.close(Side::Upstream);
    state.close(Side::Client);

    tracing::debug!(session = %session, terminated = state.is_terminated(), "WebSocket session closed");
}
