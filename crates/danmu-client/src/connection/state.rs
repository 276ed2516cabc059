//! Session lifecycle state
//!
//! ```text
//! Disconnected -> Connecting -> Authenticating -> Live -> Closed
//!       \              \               \            \
//!        +--------------+---------------+------------+--> Failed
//! ```
//!
//! `Closed` and `Failed` are terminal.

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

use super::SessionError;

/// Lifecycle state of one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    /// Not dialed yet
    Disconnected,
    /// Dial in progress
    Connecting,
    /// Socket open, auth frame being sent
    Authenticating,
    /// Auth sent, reading frames
    Live,
    /// Shut down on request
    Closed,
    /// Torn down after a transport or framing error
    Failed,
}

impl SessionState {
    /// Returns true once the session can no longer change state
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }

    /// Returns true while frames are being received
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    /// Check if the lifecycle allows moving to `next`
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        match (self, next) {
            (Self::Disconnected, Self::Connecting)
            | (Self::Connecting, Self::Authenticating)
            | (Self::Authenticating, Self::Live)
            | (Self::Live, Self::Closed) => true,
            (from, Self::Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Authenticating => write!(f, "Authenticating"),
            Self::Live => write!(f, "Live"),
            Self::Closed => write!(f, "Closed"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Shared, observable lifecycle state
///
/// Cloning yields another handle to the same state.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    inner: Arc<RwLock<SessionState>>,
}

impl SessionStatus {
    /// Create a status starting at `Disconnected`
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(SessionState::Disconnected)),
        }
    }

    /// Current state
    #[must_use]
    pub fn get(&self) -> SessionState {
        *self.inner.read()
    }

    /// Move to `next` if the lifecycle allows it
    pub fn transition(&self, next: SessionState) -> Result<(), SessionError> {
        let mut state = self.inner.write();
        if !state.can_transition_to(next) {
            return Err(SessionError::InvalidTransition {
                from: *state,
                to: next,
            });
        }
        *state = next;
        Ok(())
    }

    /// Move to `Failed` unless already terminal
    pub fn fail(&self) {
        let mut state = self.inner.write();
        if !state.is_terminal() {
            *state = SessionState::Failed;
        }
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::new()
    }
}
