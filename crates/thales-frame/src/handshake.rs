//! The session handshake envelope.
//!
//! Sent exactly once, as the first message of a session. Unlike every other
//! message it carries no type byte:
//!
//! ```text
//! ┌──────────────┬──────────────┬──────────────┬──────────────┬───────────────┐
//! │ Name length  │ Version      │ Buffer size  │ Reserved     │ Session name  │
//! │ (2B LE)      │ 0x02 0xD0    │ 0xFF 0xFF    │ 0xFF 0xFF    │ (length bytes)│
//! └──────────────┴──────────────┴──────────────┴──────────────┴───────────────┘
//! ```
//!
//! Term does not acknowledge the handshake.

use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// Handshake header: name length (2) + version (2) + buffer size (2) + reserved (2).
pub const HANDSHAKE_HEADER_SIZE: usize = 8;

/// Protocol version bytes, in wire order.
pub const PROTOCOL_VERSION: [u8; 2] = [0x02, 0xD0];

/// Requested receive buffer size (maximum).
pub const BUFFER_SIZE: u16 = 0xFFFF;

/// Reserved field, always all bits set.
pub const RESERVED: u16 = 0xFFFF;

/// Parsed handshake header, as seen by the receiving side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeHeader {
    pub name_len: u16,
    pub version: [u8; 2],
    pub buffer_size: u16,
    pub reserved: u16,
}

/// Encode the handshake envelope for `session_name`.
pub fn encode_handshake(session_name: &str, dst: &mut BytesMut) -> Result<()> {
    let name = session_name.as_bytes();
    if name.len() > u16::MAX as usize {
        return Err(FrameError::SessionNameTooLong {
            len: name.len(),
            max: u16::MAX as usize,
        });
    }
    dst.reserve(HANDSHAKE_HEADER_SIZE + name.len());
    dst.put_u16_le(name.len() as u16);
    dst.put_slice(&PROTOCOL_VERSION);
    dst.put_u16_le(BUFFER_SIZE);
    dst.put_u16_le(RESERVED);
    dst.put_slice(name);
    Ok(())
}

/// Parse a handshake header.
pub fn decode_handshake_header(header: &[u8; HANDSHAKE_HEADER_SIZE]) -> HandshakeHeader {
    HandshakeHeader {
        name_len: u16::from_le_bytes([header[0], header[1]]),
        version: [header[2], header[3]],
        buffer_size: u16::from_le_bytes([header[4], header[5]]),
        reserved: u16::from_le_bytes([header[6], header[7]]),
    }
}
