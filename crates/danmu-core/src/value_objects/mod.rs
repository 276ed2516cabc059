//! Value objects

mod room_id;

pub use room_id::RoomId;
