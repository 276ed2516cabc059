//! Broadcast operation codes
//!
//! Defines the frame header op codes this client recognizes.

/// Broadcast operation codes
///
/// Op codes select the semantic category of a frame. Values outside this set
/// are valid wire content; they are carried raw in [`Frame`](super::Frame)
/// and ignored by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum OpCode {
    /// Heartbeat - keep connection alive (client only)
    HeartbeatSend = 2,
    /// Popularity - viewer count as a big-endian u32 (server only)
    Popularity = 3,
    /// Command - JSON event envelope keyed by `cmd` (server only)
    Command = 5,
    /// Auth - join a room (client only)
    Auth = 7,
    /// Heartbeat echo - server side of the heartbeat exchange (server only)
    HeartbeatRecv = 8,
}

impl OpCode {
    /// Create an `OpCode` from a raw header value
    #[must_use]
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            2 => Some(Self::HeartbeatSend),
            3 => Some(Self::Popularity),
            5 => Some(Self::Command),
            7 => Some(Self::Auth),
            8 => Some(Self::HeartbeatRecv),
            _ => None,
        }
    }

    /// Get the raw header value
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// Get the name of this op code
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HeartbeatSend => "HeartbeatSend",
            Self::Popularity => "Popularity",
            Self::Command => "Command",
            Self::Auth => "Auth",
            Self::HeartbeatRecv => "HeartbeatRecv",
        }
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u32())
    }
}
