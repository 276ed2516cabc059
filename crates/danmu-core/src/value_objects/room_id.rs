//! Room ID - numeric identifier of one broadcast's chat channel
//!
//! A room can be addressed by a short, human-facing id or by its canonical id.
//! Both are positive integers; the canonical one is what the broadcast server
//! expects in the auth payload.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Numeric broadcast room identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(u64);

impl RoomId {
    /// Create a new RoomId, rejecting zero
    pub fn new(id: u64) -> Result<Self, DomainError> {
        if id == 0 {
            return Err(DomainError::ZeroRoomId);
        }
        Ok(Self(id))
    }

    /// Get the inner u64 value
    #[inline]
    pub const fn into_inner(self) -> u64 {
        self.0
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let id = s
            .trim()
            .parse::<u64>()
            .map_err(|_| DomainError::InvalidRoomId(s.to_string()))?;
        Self::new(id)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for RoomId {
    type Error = DomainError;

    fn try_from(id: u64) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<RoomId> for u64 {
    fn from(id: RoomId) -> Self {
        id.0
    }
}

impl std::str::FromStr for RoomId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoomId::parse(s)
    }
}
