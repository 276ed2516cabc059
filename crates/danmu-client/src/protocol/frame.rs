//! Binary frame codec
//!
//! Every message exchanged with the broadcast server is one or more frames,
//! each a fixed 16-byte header followed by a payload:
//!
//! ```text
//! offset  width  field             notes
//! 0       4      total_size        header + payload, big-endian u32
//! 4       2      header_size       always 16, big-endian u16
//! 6       2      protocol_version  always 1, big-endian u16
//! 8       4      operation         op code, big-endian u32
//! 12      4      sequence          1 on client frames, big-endian u32
//! 16      n      payload           total_size - 16 bytes
//! ```
//!
//! The header is written and read field by field, so the layout never depends
//! on how [`Frame`] is laid out in memory.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

use super::OpCode;

/// Serialized header length in bytes
pub const HEADER_SIZE: usize = 4 + 2 + 2 + 4 + 4;

/// Protocol generation written into every client frame
pub const PROTOCOL_VERSION: u16 = 1;

/// Sequence value written into every client frame
pub const CLIENT_SEQUENCE: u32 = 1;

/// Framing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Declared sizes are inconsistent with the bytes available
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Payload cannot be described by the 32-bit size field
    #[error("Frame too large: payload of {len} bytes overflows the size field")]
    FrameTooLarge { len: usize },
}

/// A decoded or to-be-encoded frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub total_size: u32,
    pub header_size: u16,
    pub protocol_version: u16,
    /// Raw op code; see [`Frame::opcode`]
    pub operation: u32,
    pub sequence: u32,
    pub payload: Bytes,
}

impl Frame {
    /// Build a client frame for a known op code
    pub fn new(op: OpCode, payload: impl Into<Bytes>) -> Result<Self, FrameError> {
        Self::with_operation(op.as_u32(), payload)
    }

    /// Build a client frame with a raw op code
    pub fn with_operation(operation: u32, payload: impl Into<Bytes>) -> Result<Self, FrameError> {
        let payload = payload.into();
        Ok(Self {
            total_size: total_size_for(payload.len())?,
            header_size: HEADER_SIZE as u16,
            protocol_version: PROTOCOL_VERSION,
            operation,
            sequence: CLIENT_SEQUENCE,
            payload,
        })
    }

    /// The recognized op code, if any
    #[must_use]
    pub fn opcode(&self) -> Option<OpCode> {
        OpCode::from_u32(self.operation)
    }

    /// Payload bytes
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Serialize header then payload
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + self.payload.len());
        buf.put_u32(self.total_size);
        buf.put_u16(self.header_size);
        buf.put_u16(self.protocol_version);
        buf.put_u32(self.operation);
        buf.put_u32(self.sequence);
        buf.put_slice(&self.payload);
        buf.freeze()
    }
}

fn total_size_for(payload_len: usize) -> Result<u32, FrameError> {
    payload_len
        .checked_add(HEADER_SIZE)
        .and_then(|total| u32::try_from(total).ok())
        .ok_or(FrameError::FrameTooLarge { len: payload_len })
}

/// Encode one client frame
pub fn encode(op: OpCode, payload: &[u8]) -> Result<Bytes, FrameError> {
    Frame::new(op, Bytes::copy_from_slice(payload)).map(|frame| frame.to_bytes())
}

/// Decode the first frame in `bytes`
///
/// Bytes after the declared `total_size` are ignored; use [`decode_all`] when
/// a message may carry several frames.
pub fn decode(bytes: impl Into<Bytes>) -> Result<Frame, FrameError> {
    let mut buf = bytes.into();
    decode_next(&mut buf)
}

/// Decode every frame packed back to back in `bytes`
///
/// A truncated trailing frame fails the whole message.
pub fn decode_all(bytes: impl Into<Bytes>) -> Result<Vec<Frame>, FrameError> {
    let mut buf = bytes.into();
    let mut frames = Vec::new();
    while buf.has_remaining() {
        frames.push(decode_next(&mut buf)?);
    }
    Ok(frames)
}

fn decode_next(buf: &mut Bytes) -> Result<Frame, FrameError> {
    if buf.remaining() < HEADER_SIZE {
        return Err(FrameError::MalformedFrame(format!(
            "need {HEADER_SIZE} header bytes, got {}",
            buf.remaining()
        )));
    }

    let total_size = buf.get_u32();
    let header_size = buf.get_u16();
    let protocol_version = buf.get_u16();
    let operation = buf.get_u32();
    let sequence = buf.get_u32();

    // Checked before the payload length is derived so it can never underflow
    if (total_size as usize) < HEADER_SIZE {
        return Err(FrameError::MalformedFrame(format!(
            "total size {total_size} is smaller than the {HEADER_SIZE}-byte header"
        )));
    }
    if header_size as usize != HEADER_SIZE {
        return Err(FrameError::MalformedFrame(format!(
            "unexpected header size {header_size}"
        )));
    }

    let payload_len = total_size as usize - HEADER_SIZE;
    if buf.remaining() < payload_len {
        return Err(FrameError::MalformedFrame(format!(
            "declared {payload_len} payload bytes, got {}",
            buf.remaining()
        )));
    }

    Ok(Frame {
        total_size,
        header_size,
        protocol_version,
        operation,
        sequence,
        payload: buf.split_to(payload_len),
    })
}
