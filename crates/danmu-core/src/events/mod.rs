//! Live events emitted by a broadcast room

mod live_event;

pub use live_event::LiveEvent;
