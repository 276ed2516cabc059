//! Client payload definitions
//!
//! Defines the JSON payloads the client writes into auth and heartbeat frames.

use danmu_core::RoomId;
use serde::Serialize;

/// Payload for heartbeat frames (an empty JSON object)
pub const HEARTBEAT_PAYLOAD: &[u8] = b"{}";

/// Payload for op 7 (Auth)
///
/// Field order is part of the wire contract; serde keeps declaration order.
#[derive(Debug, Clone, Serialize)]
pub struct AuthPayload {
    /// Always 0, the client joins anonymously
    pub uid: u64,
    pub roomid: RoomId,
    pub protover: u16,
    pub platform: String,
    pub clientver: String,
}

impl AuthPayload {
    /// Protocol version declared in the auth payload
    pub const PROTOVER: u16 = 1;

    /// Create an anonymous auth payload for a room
    #[must_use]
    pub fn new(room_id: RoomId, platform: impl Into<String>, clientver: impl Into<String>) -> Self {
        Self {
            uid: 0,
            roomid: room_id,
            protover: Self::PROTOVER,
            platform: platform.into(),
            clientver: clientver.into(),
        }
    }

    /// Serialize to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
