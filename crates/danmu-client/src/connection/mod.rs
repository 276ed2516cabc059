//! Connection management
//!
//! Owns one broadcast connection: dial, auth handshake, the read loop, the
//! outbound writer, and the lifecycle state machine.

mod error;
mod session;
mod state;
mod writer;

pub use error::{SessionError, SessionResult};
pub use session::{Session, SessionBuilder, SessionCloser};
pub use state::{SessionState, SessionStatus};
pub use writer::{spawn_writer, WriterCommand, WriterHandle};
