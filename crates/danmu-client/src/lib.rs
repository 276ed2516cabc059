//! # danmu-client
//!
//! Client for a live-room chat broadcast server: binary frame codec, session
//! lifecycle with a fire-and-forget auth handshake, heartbeat scheduling, and
//! dispatch of decoded command events to an injected sink.

pub mod connection;
pub mod handlers;
pub mod heartbeat;
pub mod protocol;
pub mod resolver;
pub mod sink;


pub use connection::{Session, SessionBuilder, SessionCloser, SessionError, SessionState};
pub use handlers::{CommandRegistry, EventDispatcher};
pub use resolver::{ResolveError, RoomResolver};
pub use sink::{format_event, ConsoleSink};
