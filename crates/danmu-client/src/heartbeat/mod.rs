//! Heartbeat scheduling
//!
//! Keeps a session alive with periodic heartbeat frames, plus one extra
//! frame for every heartbeat echo the server sends back.

mod scheduler;

pub use scheduler::{HeartbeatHandle, HeartbeatScheduler};
