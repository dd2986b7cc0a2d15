use std::io::ErrorKind;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::TermStream;

/// Well-known TCP port Term listens on.
pub const TERM_PORT: u16 = 260;

/// Opens TCP connections to Term.
///
/// Resolves host names as well as literal IPv4/IPv6 addresses and tries each
/// resolved address in turn. No retry policy beyond that: a failed connect is
/// reported to the caller as-is.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    port: u16,
    connect_timeout: Option<Duration>,
    nodelay: bool,
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self {
            port: TERM_PORT,
            connect_timeout: None,
            nodelay: true,
        }
    }
}

impl TcpConnector {
    /// Connector for the default Term port.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the destination port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Bound each connect attempt.
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Toggle `TCP_NODELAY` on established streams.
    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    /// Destination port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Connect to Term at `address` (blocking).
    pub fn connect(&self, address: &str) -> Result<TermStream> {
        let candidates = self.resolve(address)?;

        let mut last_err = None;
        for addr in candidates {
            let attempt = match self.connect_timeout {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    if self.nodelay {
                        stream.set_nodelay(true)?;
                    }
                    info!(%addr, "connected to term");
                    return TermStream::from_tcp(stream);
                }
                Err(err) => {
                    debug!(%addr, error = %err, "connect attempt failed");
                    last_err = Some(err);
                }
            }
        }

        Err(TransportError::Connect {
            address: format!("{address}:{}", self.port),
            source: last_err
                .unwrap_or_else(|| std::io::Error::new(ErrorKind::NotFound, "no address tried")),
        })
    }

    fn resolve(&self, address: &str) -> Result<Vec<SocketAddr>> {
        let address = address.trim();
        if address.is_empty() {
            return Err(TransportError::Resolve {
                address: address.to_string(),
                source: std::io::Error::new(ErrorKind::InvalidInput, "empty address"),
            });
        }

        let resolved: Vec<SocketAddr> = (address, self.port)
            .to_socket_addrs()
            .map_err(|source| TransportError::Resolve {
                address: address.to_string(),
                source,
            })?
            .collect();

        if resolved.is_empty() {
            return Err(TransportError::NoAddress {
                address: address.to_string(),
            });
        }

        debug!(address, port = self.port, count = resolved.len(), "resolved term address");
        Ok(resolved)
    }
}
