//! Output sink port
//!
//! The protocol layer hands every decoded [`LiveEvent`] to a sink injected at
//! session construction. Implementations own all presentation.

use crate::events::LiveEvent;

/// Receives decoded live events
///
/// Called from concurrent dispatch tasks, so implementations must be
/// thread-safe and should not block for long.
pub trait EventSink: Send + Sync {
    /// Deliver one event
    fn emit(&self, event: LiveEvent);
}

impl<F> EventSink for F
where
    F: Fn(LiveEvent) + Send + Sync,
{
    fn emit(&self, event: LiveEvent) {
        self(event);
    }
}
