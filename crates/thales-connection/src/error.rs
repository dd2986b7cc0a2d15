use crate::state::ConnectionState;

/// Errors that can occur in connection operations.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] thales_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] thales_frame::FrameError),

    /// The operation needs an established session.
    #[error("not connected to term")]
    NotConnected,

    /// The operation is not allowed in the current state.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: ConnectionState,
    },

    /// The receiver stopped and no queued telegram is left.
    #[error("connection closed")]
    Closed,

    /// The background receiver thread could not be started.
    #[error("failed to spawn receiver thread: {0}")]
    ReceiverSpawn(std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConnectionError>;
