//! Room lookup
//!
//! Maps the room number a user types (often a short vanity id) to the
//! canonical room id the broadcast server expects in the auth frame.

mod error;
mod room_resolver;

pub use error::ResolveError;
pub use room_resolver::RoomResolver;
