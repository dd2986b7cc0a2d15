//! Telegram framing for the Thales remote protocol.
//!
//! Every telegram on the wire is framed with:
//! - A 2-byte little-endian payload length
//! - A 1-byte message type
//!
//! The very first message of a session is the exception: an 8-byte
//! handshake header followed by the session name (see [`handshake`]).
//!
//! No partial reads, no buffer management in user code.

pub mod codec;
pub mod error;
pub mod handshake;
pub mod message_type;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_header, encode_telegram, FrameConfig, Telegram, TelegramDecoder, HEADER_SIZE,
    MAX_PAYLOAD,
};
pub use error::{FrameError, Result};
pub use handshake::{
    decode_handshake_header, encode_handshake, HandshakeHeader, BUFFER_SIZE,
    HANDSHAKE_HEADER_SIZE, PROTOCOL_VERSION, RESERVED,
};
pub use message_type::{message_type_name, APP_CONTROL, CONTROL, DISCONNECT_PAYLOAD, REMOTE_SCRIPT};
pub use reader::TelegramReader;
pub use writer::TelegramWriter;
