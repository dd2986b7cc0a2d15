//! TCP transport to the Term process of a Zahner Thales workstation.
//!
//! This is the lowest layer of the stack. It opens the byte stream to Term,
//! exposes read/write on it, and provides the directed half shutdown that the
//! connection layer uses to unblock its background reader.
//!
//! Everything else builds on top of the [`TermStream`] type provided here.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::TermStream;
pub use tcp::{TcpConnector, TERM_PORT};
