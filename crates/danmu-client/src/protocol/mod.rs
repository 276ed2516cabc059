//! Broadcast protocol definitions
//!
//! Defines the binary frame format, op codes, and client payloads.

mod frame;
mod opcodes;
mod payloads;

pub use frame::{
    decode, decode_all, encode, Frame, FrameError, CLIENT_SEQUENCE, HEADER_SIZE, PROTOCOL_VERSION,
};
pub use opcodes::OpCode;
pub use payloads::{AuthPayload, HEARTBEAT_PAYLOAD};
