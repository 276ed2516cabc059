//! Resolver error types

use danmu_common::AppError;
use danmu_core::DomainError;
use thiserror::Error;

/// Room lookup error type
///
/// Every variant is fatal to startup.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Request failed or the body was not JSON
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Lookup service answered with a non-success status
    #[error("Unexpected status {0}")]
    Status(u16),

    /// Response has no integer at `data.room_id`
    #[error("Response has no data.room_id")]
    MissingRoomId,

    /// Response carries a room id that is not usable
    #[error(transparent)]
    InvalidRoomId(#[from] DomainError),
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        AppError::Resolve(err.to_string())
    }
}
