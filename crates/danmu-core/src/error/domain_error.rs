//! Domain errors - error types for the domain layer

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Invalid room id: {0}")]
    InvalidRoomId(String),

    #[error("Room id must be positive")]
    ZeroRoomId,
}

impl DomainError {
    /// Get an error code string for logs and exit reporting
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRoomId(_) => "INVALID_ROOM_ID",
            Self::ZeroRoomId => "ZERO_ROOM_ID",
        }
    }
}
