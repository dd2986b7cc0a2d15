use std::time::Duration;

/// Errors that can occur while executing Remote Script commands.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Session-level error.
    #[error("connection error: {0}")]
    Connection(#[from] thales_connection::ConnectionError),

    /// Term answered with an empty reply.
    #[error("no reply to {command:?}")]
    NoReply { command: String },

    /// No reply arrived within the configured reply timeout.
    #[error("no reply to {command:?} within {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    /// The reply does not have the expected `key=value:` shape.
    #[error("unexpected reply to {command:?}: {reply:?}")]
    UnexpectedReply { command: String, reply: String },

    /// A value in the reply is not a number.
    #[error("invalid number {value:?} in reply")]
    InvalidNumber {
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    /// Sweep bounds must be positive and finite.
    #[error("invalid sweep range {lower} .. {upper}")]
    InvalidSweep { lower: f64, upper: f64 },
}

pub type Result<T> = std::result::Result<T, ScriptError>;
