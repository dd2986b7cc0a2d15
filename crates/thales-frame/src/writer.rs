use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use thales_transport::TermStream;
use tracing::trace;

use crate::codec::{encode_telegram, FrameConfig, Telegram};
use crate::error::{FrameError, Result};
use crate::handshake::encode_handshake;
use crate::message_type::message_type_name;
use crate::reader::transport_to_frame_error;

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Writes complete telegrams to any `Write` stream.
///
/// Header and payload are encoded into one buffer and written as a single
/// logical message. Term cannot cope with a header that arrives long before
/// its payload.
#[derive(Debug)]
pub struct TelegramWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> TelegramWriter<T> {
    /// Create a new telegram writer.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Write a complete telegram (blocking).
    pub fn write_telegram(&mut self, telegram: &Telegram) -> Result<()> {
        self.send(telegram.message_type(), telegram.payload().as_ref())
    }

    /// Encode and send a payload with the given message type.
    pub fn send(&mut self, message_type: u8, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_telegram(message_type, payload, &mut self.buf)?;
        trace!(
            message_type = message_type_name(message_type),
            len = payload.len(),
            "sending telegram"
        );
        self.write_buffer()
    }

    /// Encode and send the session handshake envelope.
    pub fn send_handshake(&mut self, session_name: &str) -> Result<()> {
        self.buf.clear();
        encode_handshake(session_name, &mut self.buf)?;
        trace!(session_name, "sending handshake");
        self.write_buffer()
    }

    fn write_buffer(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl TelegramWriter<TermStream> {
    /// Create a telegram writer for `TermStream` and apply write timeout from config.
    pub fn with_config_term(inner: TermStream, config: &FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::new(inner))
    }
}
