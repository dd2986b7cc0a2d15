use std::borrow::Cow;
use std::time::Duration;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Telegram header: length (2) + message type (1) = 3 bytes.
pub const HEADER_SIZE: usize = 3;

/// Largest payload the 16-bit length field can describe.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// One complete message exchanged with Term.
///
/// Immutable once built; the payload length is validated on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Telegram {
    message_type: u8,
    payload: Bytes,
}

impl Telegram {
    /// Create a new telegram.
    pub fn new(message_type: u8, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        check_payload_len(payload.len())?;
        Ok(Self {
            message_type,
            payload,
        })
    }

    /// The message type byte.
    pub fn message_type(&self) -> u8 {
        self.message_type
    }

    /// The raw payload.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Consume the telegram and return its payload.
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// The payload as text, replacing invalid UTF-8 sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// The total wire size of this telegram (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a telegram into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────┬──────────────────┐
/// │ Length       │ Type     │ Payload          │
/// │ (2B LE)      │ (1B)     │ (Length bytes)   │
/// └──────────────┴──────────┴──────────────────┘
/// ```
pub fn encode_telegram(message_type: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    check_payload_len(payload.len())?;
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u16_le(payload.len() as u16);
    dst.put_u8(message_type);
    dst.put_slice(payload);
    Ok(())
}

/// Parse a telegram header into `(payload length, message type)`.
pub fn decode_header(header: &[u8; HEADER_SIZE]) -> (u16, u8) {
    (u16::from_le_bytes([header[0], header[1]]), header[2])
}

fn check_payload_len(len: usize) -> Result<()> {
    if len > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: len,
            max: MAX_PAYLOAD,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    AwaitingHeader,
    AwaitingPayload { length: usize, message_type: u8 },
}

/// Incremental telegram decoder.
///
/// Consumes the header as soon as three bytes are buffered and then waits
/// for exactly `length` payload bytes. Bytes belonging to the next telegram
/// are left in the buffer.
#[derive(Debug)]
pub struct TelegramDecoder {
    state: DecodeState,
}

impl Default for TelegramDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TelegramDecoder {
    pub fn new() -> Self {
        Self {
            state: DecodeState::AwaitingHeader,
        }
    }

    /// Decode the next telegram from `src`.
    ///
    /// Returns `None` if `src` doesn't contain a complete telegram yet.
    pub fn decode(&mut self, src: &mut BytesMut) -> Option<Telegram> {
        loop {
            match self.state {
                DecodeState::AwaitingHeader => {
                    if src.len() < HEADER_SIZE {
                        return None;
                    }
                    let header = [src[0], src[1], src[2]];
                    src.advance(HEADER_SIZE);
                    let (length, message_type) = decode_header(&header);
                    self.state = DecodeState::AwaitingPayload {
                        length: length as usize,
                        message_type,
                    };
                }
                DecodeState::AwaitingPayload {
                    length,
                    message_type,
                } => {
                    if src.len() < length {
                        return None;
                    }
                    let payload = src.split_to(length).freeze();
                    self.state = DecodeState::AwaitingHeader;
                    return Some(Telegram {
                        message_type,
                        payload,
                    });
                }
            }
        }
    }

    /// Number of bytes still missing before the current stage completes,
    /// given `buffered` bytes already held.
    pub fn bytes_needed(&self, buffered: usize) -> usize {
        let target = match self.state {
            DecodeState::AwaitingHeader => HEADER_SIZE,
            DecodeState::AwaitingPayload { length, .. } => length,
        };
        target.saturating_sub(buffered)
    }

    /// Whether a telegram header has been consumed without its payload.
    pub fn is_mid_telegram(&self) -> bool {
        matches!(self.state, DecodeState::AwaitingPayload { .. })
    }

    /// Drop any partially decoded telegram.
    pub fn reset(&mut self) {
        self.state = DecodeState::AwaitingHeader;
    }
}

/// I/O configuration for telegram readers and writers.
#[derive(Debug, Clone, Default)]
pub struct FrameConfig {
    /// Read timeout for blocking operations.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<Duration>,
}
