//! StreamConnector port - how the client opens an event stream.
//!
//! The connection manager's state machine (retry, backoff, disconnect
//! semantics) is independent of the wire: this port hides the HTTP/SSE
//! details behind "open a stream of named frames", so the state machine is
//! testable with a scripted connector.

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

/// One named frame received from the stream.
///
/// `data` is the raw JSON text of the frame; decoding into an
/// `EventEnvelope` happens in the connection manager so that a malformed
/// frame can be dropped without tearing the stream down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFrame {
    /// Event name from the frame (e.g. "horses:created", "connected").
    pub event: String,

    /// Raw frame data.
    pub data: String,
}

/// Errors produced while opening or reading a stream.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The stream could not be opened (DNS, TCP, TLS, request build).
    #[error("Failed to open stream: {0}")]
    Connect(String),

    /// The server rejected the stream request.
    #[error("Stream rejected with HTTP status {0}")]
    Rejected(u16),

    /// The open stream failed mid-read (broken pipe, proxy timeout).
    #[error("Stream read failed: {0}")]
    Read(String),
}

impl TransportError {
    /// Creates a connect error with a message.
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect(message.into())
    }

    /// Creates a read error with a message.
    pub fn read(message: impl Into<String>) -> Self {
        Self::Read(message.into())
    }
}

/// Live stream of frames; ends when the server closes the connection.
pub type FrameStream = BoxStream<'static, Result<StreamFrame, TransportError>>;

/// Port for opening one long-lived event stream.
///
/// A successful return is the transport-level "open" signal: the connection
/// manager transitions to `Connected` as soon as `connect` resolves.
#[async_trait]
pub trait StreamConnector: Send + Sync {
    /// Opens a fresh stream. Each call is a full registration; no resume
    /// state is carried between attempts.
    async fn connect(&self) -> Result<FrameStream, TransportError>;
}
