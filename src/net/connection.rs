//! Connection state machine for relayed WebSocket sessions.
//!
//! # Responsibilities
//! - Generate unique session IDs for tracing
//! - Track each side of a session pair (Connecting → Open → Closed)

use std::sync::atomic::{AtomicU64, Ordering};

/// Global atomic counter for session IDs.
/// Relaxed ordering is enough, the value only has to be unique.
static SESSION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a relayed WebSocket session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Generate a new unique session ID.
    pub fn new() -> Self {
        Self(SESSION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ws-{}", self.0)
    }
}

/// State of one side of a session pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handshake in progress.
    Connecting,
    /// Frames may be sent and received.
    Open,
    /// Closed by a close frame, end of stream or error. Terminal.
    Closed,
}

/// One of the two connections in a session pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Client,
    Upstream,
}

impl Side {
    /// The other connection of the pair.
    pub fn peer(self) -> Self {
        match self {
            Side::Client => Side::Upstream,
            Side::Upstream => Side::Client,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Client => f.write_str("client"),
            Side::Upstream => f.write_str("upstream"),
        }
    }
}

/// Both sides of a session pair.
///
/// Transitions only move forward; a closed side never reopens.
#[derive(Debug, Clone)]
pub struct SessionState {
    id: SessionId,
    client: ConnectionState,
    upstream: ConnectionState,
}

impl SessionState {
    /// New session with both sides connecting.
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            client: ConnectionState::Connecting,
            upstream: ConnectionState::Connecting,
        }
    }

    pub fn get(&self, side: Side) -> ConnectionState {
        match side {
            Side::Client => self.client,
            Side::Upstream => self.upstream,
        }
    }

    /// Mark a side open. Has no effect once the side is closed.
    pub fn open(&mut self, side: Side) {
        let state = self.slot(side);
        if *state == ConnectionState::Connecting {
            *state = ConnectionState::Open;
            tracing::trace!(session = %self.id, side = %side, "Connection open");
        }
    }

    /// Mark a side closed. Returns `true` on the first transition.
    pub fn close(&mut self, side: Side) -> bool {
        let state = self.slot(side);
        if *state == ConnectionState::Closed {
            return false;
        }
        *state = ConnectionState::Closed;
        tracing::trace!(session = %self.id, side = %side, "Connection closed");
        true
    }

    pub fn is_terminated(&self) -> bool {
        self.client == ConnectionState::Closed && self.upstream == ConnectionState::Closed
    }

    fn slot(&mut self, side: Side) -> &mut ConnectionState {
        match side {
            Side::Client => &mut self.client,
            Side::Upstream => &mut self.upstream,
        }
    }
}
