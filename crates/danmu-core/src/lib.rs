//! # danmu-core
//!
//! Domain layer containing the room identifier, the live events decoded from a
//! broadcast room, and the sink trait events are delivered through.
//! This crate has zero dependencies on infrastructure (network, runtime, etc.).

pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use error::DomainError;
pub use events::LiveEvent;
pub use traits::EventSink;
pub use value_objects::RoomId;
