use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use thales_transport::TermStream;
use tracing::{debug, trace};

use crate::codec::{FrameConfig, Telegram, TelegramDecoder, HEADER_SIZE};
use crate::error::{FrameError, Result};
use crate::message_type::message_type_name;

const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;

/// Reads complete telegrams from any `Read` stream.
///
/// Handles short reads internally: each read asks for exactly the bytes the
/// current header or payload still lacks, so nothing past the telegram
/// boundary is consumed from the stream. Callers always get complete
/// telegrams.
#[derive(Debug)]
pub struct TelegramReader<T> {
    inner: T,
    buf: BytesMut,
    decoder: TelegramDecoder,
}

impl<T: Read> TelegramReader<T> {
    /// Create a new telegram reader.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            decoder: TelegramDecoder::new(),
        }
    }

    /// Read the next complete telegram (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when the stream reports
    /// EOF, whether or not part of a telegram was already received. A
    /// timeout (`WouldBlock`/`TimedOut`) is returned as `FrameError::Io`
    /// and keeps any partial telegram for the next call.
    pub fn read_telegram(&mut self) -> Result<Telegram> {
        loop {
            if let Some(telegram) = self.decoder.decode(&mut self.buf) {
                trace!(
                    message_type = message_type_name(telegram.message_type()),
                    len = telegram.len(),
                    "telegram received"
                );
                return Ok(telegram);
            }

            let needed = self.decoder.bytes_needed(self.buf.len());
            let start = self.buf.len();
            self.buf.resize(start + needed, 0);

            let read = match self.inner.read(&mut self.buf[start..]) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => {
                    self.buf.truncate(start);
                    continue;
                }
                Err(err) => {
                    self.buf.truncate(start);
                    return Err(FrameError::Io(err));
                }
            };
            self.buf.truncate(start + read);

            if read == 0 {
                if self.decoder.is_mid_telegram() || !self.buf.is_empty() {
                    debug!(
                        buffered = self.buf.len(),
                        header_consumed = self.decoder.is_mid_telegram(),
                        "stream closed mid-telegram"
                    );
                }
                self.buf.clear();
                self.decoder.reset();
                return Err(FrameError::ConnectionClosed);
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

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Bytes of an unfinished telegram currently held, header included.
    pub fn buffered(&self) -> usize {
        if self.decoder.is_mid_telegram() {
            HEADER_SIZE + self.buf.len()
        } else {
            self.buf.len()
        }
    }
}

impl TelegramReader<TermStream> {
    /// Create a telegram reader for `TermStream` and apply read timeout from config.
    pub fn with_config_term(inner: TermStream, config: &FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::new(inner))
    }
}

pub(crate) fn transport_to_frame_error(err: thales_transport::TransportError) -> FrameError {
    match err {
        thales_transport::TransportError::Io(io) => FrameError::Io(io),
        thales_transport::TransportError::Resolve { source, .. }
        | thales_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}
