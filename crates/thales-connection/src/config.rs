use std::time::Duration;

use thales_frame::FrameConfig;
use thales_transport::{TcpConnector, TERM_PORT};

/// Pause between the TCP connect and the handshake.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(400);

/// Pause after the handshake before the session is considered usable.
pub const DEFAULT_SESSION_SETUP_DELAY: Duration = Duration::from_millis(800);

/// How long `disconnect` waits for a busy sender before skipping the
/// disconnect telegram.
pub const DEFAULT_GOODBYE_TIMEOUT: Duration = Duration::from_secs(2);

/// Connection behavior configuration.
///
/// Term never acknowledges the handshake, so the two delays are the only
/// thing giving it time to set the session up. Lowering them is only safe
/// against peers known to be ready immediately.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Destination TCP port.
    pub port: u16,
    /// Bound on each TCP connect attempt. `None` uses the OS default.
    pub connect_timeout: Option<Duration>,
    /// Bound on each blocking write. `None` blocks indefinitely.
    pub write_timeout: Option<Duration>,
    /// Pause between TCP connect and handshake.
    pub settle_delay: Duration,
    /// Pause after the handshake before `connect` returns.
    pub session_setup_delay: Duration,
    /// Bound on waiting for the send lock when disconnecting.
    pub goodbye_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port: TERM_PORT,
            connect_timeout: None,
            write_timeout: None,
            settle_delay: DEFAULT_SETTLE_DELAY,
            session_setup_delay: DEFAULT_SESSION_SETUP_DELAY,
            goodbye_timeout: DEFAULT_GOODBYE_TIMEOUT,
        }
    }
}

impl ConnectionConfig {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn with_goodbye_timeout(mut self, timeout: Duration) -> Self {
        self.goodbye_timeout = timeout;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_session_setup_delay(mut self, delay: Duration) -> Self {
        self.session_setup_delay = delay;
        self
    }

    pub(crate) fn connector(&self) -> TcpConnector {
        TcpConnector::new()
            .with_port(self.port)
            .with_connect_timeout(self.connect_timeout)
    }

    pub(crate) fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            // The receiver blocks until data arrives or the read half is shut down.
            read_timeout: None,
            write_timeout: self.write_timeout,
        }
    }
}
