//! Gremlin transport error definitions.

use std::time::Duration;
use thiserror::Error;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::tungstenite::error::ProtocolError;

/// Coarse classification of a [`GremlinError`].
///
/// The resilience layer decides retry behavior from this tag rather than from
/// the rendered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The upstream closed the socket, or the handle was closed under us.
    ConnectionClosed,
    /// Opening a new connection failed.
    Connect,
    /// Any other WebSocket or IO failure.
    Transport,
    /// No reply within the request timeout.
    Timeout,
    /// Credentials rejected.
    Auth,
    /// The server answered with a non-success status.
    Server,
    /// Unexpected or malformed protocol traffic.
    Protocol,
    /// JSON encoding/decoding failed.
    Serialization,
}

/// Errors that can occur while talking to a Gremlin endpoint.
#[derive(Debug, Error)]
pub enum GremlinError {
    /// Remote side closed the connection.
    #[error("connection closed by server{}", fmt_reason(.reason))]
    ConnectionClosed { reason: Option<String> },

    /// The handle was closed locally while the request was in flight.
    #[error("connection closed locally")]
    ClosedLocally,

    /// Handshake with the endpoint failed.
    #[error("failed to connect to {endpoint}: {message}")]
    Connect { endpoint: String, message: String },

    /// WebSocket or IO failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Request exceeded its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Authentication rejected by the server.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Non-success response status.
    #[error("server error {code}: {message}")]
    Server { code: u16, message: String },

    /// Malformed or unexpected protocol traffic.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// JSON encoding/decoding failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn fmt_reason(reason: &Option<String>) -> String {
    match reason {
        Some(r) if !r.is_empty() => format!(": {}", r),
        _ => String::new(),
    }
}

impl GremlinError {
    /// Shorthand for a server-initiated close.
    pub fn closed(reason: Option<String>) -> Self {
        GremlinError::ConnectionClosed { reason }
    }

    /// Structured kind used for retry classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GremlinError::ConnectionClosed { .. } | GremlinError::ClosedLocally => {
                ErrorKind::ConnectionClosed
            }
            GremlinError::Connect { .. } => ErrorKind::Connect,
            GremlinError::Transport(_) => ErrorKind::Transport,
            GremlinError::Timeout(_) => ErrorKind::Timeout,
            GremlinError::Auth(_) => ErrorKind::Auth,
            GremlinError::Server { .. } => ErrorKind::Server,
            GremlinError::Protocol(_) => ErrorKind::Protocol,
            GremlinError::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// Map a Gremlin response status into an error.
    pub fn from_status(code: u16, message: String) -> Self {
        match code {
            401 => GremlinError::Auth(message),
            _ => GremlinError::Server { code, message },
        }
    }
}

impl From<tungstenite::Error> for GremlinError {
    fn from(err: tungstenite::Error) -> Self {
        match err {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                GremlinError::closed(None)
            }
            tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake) => {
                GremlinError::closed(Some("reset without closing handshake".to_string()))
            }
            other => GremlinError::Transport(other.to_string()),
        }
    }
}

/// Result type for Gremlin operations.
pub type GremlinResult<T> = Result<T, GremlinError>;
