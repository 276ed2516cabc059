//! Handler error types

use thiserror::Error;

/// Handler error type
///
/// Handler errors are never fatal to a session: the dispatcher logs them and
/// skips the offending frame.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Payload has the wrong size or is missing a required field
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Payload is not valid JSON
    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl HandlerError {
    /// Create a malformed payload error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedPayload(msg.into())
    }

    /// Get error code for structured logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            Self::Json(_) => "INVALID_JSON",
        }
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
