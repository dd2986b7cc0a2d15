//! Session management for the Thales remote protocol.
//!
//! This is the "just works" layer. Connect to Term, send telegrams, and
//! consume replies from a queue fed by a background receiver thread, with
//! blocking or timed waits.
//!
//! ```no_run
//! use std::time::Duration;
//! use thales_connection::Connection;
//! use thales_frame::REMOTE_SCRIPT;
//!
//! # fn main() -> thales_connection::Result<()> {
//! let connection = Connection::new();
//! connection.connect("192.168.2.78", "ScriptRemote")?;
//!
//! connection.clear_incoming_telegram_queue();
//! connection.send_telegram("1:POTENTIAL:", REMOTE_SCRIPT)?;
//! if let Some(reply) = connection.wait_for_telegram_timeout(Duration::from_secs(5))? {
//!     println!("{}", reply.text());
//! }
//!
//! connection.disconnect()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod inbox;
pub mod receiver;
pub mod state;

pub use config::{ConnectionConfig, DEFAULT_SESSION_SETUP_DELAY, DEFAULT_SETTLE_DELAY};
pub use connection::Connection;
pub use error::{ConnectionError, Result};
pub use inbox::Inbox;
pub use receiver::ReceiverHandle;
pub use state::ConnectionState;
pub use thales_frame::Telegram;
