/// Errors that can occur during telegram encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload does not fit the 16-bit length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The session name does not fit the 16-bit handshake length field.
    #[error("session name too long ({len} bytes, max {max})")]
    SessionNameTooLong { len: usize, max: usize },

    /// An I/O error occurred while reading or writing telegrams.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete telegram was received.
    #[error("connection closed (incomplete telegram)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
