//! Application error types
//!
//! Unified error reporting for the command-line client. Library layers keep
//! their own typed errors and are folded into this one at the binary edge.

use danmu_core::DomainError;
use std::fmt;

use crate::config::ConfigError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Startup errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Collaborator errors
    #[error("Room lookup failed: {0}")]
    Resolve(String),

    // Session errors
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // Internal errors
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl AppError {
    /// Get the process exit code for this error
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            // Usage errors
            Self::Config(_) | Self::InvalidInput(_) | Self::Domain(_) => 2,

            // Runtime failures
            Self::Resolve(_) | Self::Transport(_) | Self::Protocol(_) | Self::Internal(_) => 1,
        }
    }

    /// Get error code for structured logs
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Resolve(_) => "RESOLVE_ERROR",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Protocol(_) => "PROTOCOL_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Check if this error happened before a session was established
    #[must_use]
    pub fn is_startup_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::InvalidInput(_) | Self::Resolve(_) | Self::Domain(_)
        )
    }

    /// Create a transport error
    #[must_use]
    pub fn transport(msg: impl fmt::Display) -> Self {
        Self::Transport(msg.to_string())
    }

    /// Create a protocol error
    #[must_use]
    pub fn protocol(msg: impl fmt::Display) -> Self {
        Self::Protocol(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
