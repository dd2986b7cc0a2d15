/// Errors that can occur in Term transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The address could not be resolved.
    #[error("failed to resolve {address}: {source}")]
    Resolve {
        address: String,
        source: std::io::Error,
    },

    /// The address resolved to nothing usable.
    #[error("no socket address found for {address}")]
    NoAddress { address: String },

    /// Failed to connect to the resolved address.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        source: std::io::Error,
    },

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
