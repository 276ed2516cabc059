//! Session error types

use super::SessionState;
use crate::protocol::FrameError;
use thiserror::Error;

/// Session error type
#[derive(Debug, Error)]
pub enum SessionError {
    /// Dial, read, write or close failure on the socket
    #[error("Transport error: {0}")]
    Transport(String),

    /// Framing error on an inbound message
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// Outbound payload could not be serialized
    #[error("Payload encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Lifecycle state machine rejected a move
    #[error("Invalid session transition: {from} -> {to}")]
    InvalidTransition { from: SessionState, to: SessionState },

    /// The writer task is gone
    #[error("Outbound writer closed")]
    WriterClosed,

    /// Builder used without a required field
    #[error("Missing session option: {0}")]
    MissingOption(&'static str),
}

impl SessionError {
    /// Create a transport error
    pub fn transport(msg: impl std::fmt::Display) -> Self {
        Self::Transport(msg.to_string())
    }

    /// Check if this error comes from the socket rather than the protocol
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::WriterClosed)
    }
}

/// Session result type
pub type SessionResult<T> = Result<T, SessionError>;
