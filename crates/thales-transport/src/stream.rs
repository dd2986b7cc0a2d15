use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use tracing::trace;

use crate::error::Result;

/// A connected stream to Term. Implements `Read` and `Write`.
///
/// This is the fundamental I/O type returned by [`crate::TcpConnector`].
/// Clones made with [`TermStream::try_clone`] share the same socket, so a
/// half shutdown issued on one handle is observed by all of them.
pub struct TermStream {
    inner: TcpStream,
    peer: SocketAddr,
}

impl Read for TermStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for TermStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl TermStream {
    /// Wrap an already connected TCP stream.
    pub fn from_tcp(inner: TcpStream) -> Result<Self> {
        let peer = inner.peer_addr()?;
        Ok(Self { inner, peer })
    }

    /// Address of the Term endpoint this stream is connected to.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Local address of the stream.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.inner.local_addr().map_err(Into::into)
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_write_timeout(timeout).map_err(Into::into)
    }

    /// Disable Nagle's algorithm so small telegrams leave immediately.
    pub fn set_nodelay(&self, nodelay: bool) -> Result<()> {
        self.inner.set_nodelay(nodelay).map_err(Into::into)
    }

    /// Try to clone this stream (creates a new file descriptor on the same socket).
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.inner.try_clone()?;
        Ok(Self {
            inner: cloned,
            peer: self.peer,
        })
    }

    /// Shut down the read half of the socket.
    ///
    /// A read blocked on any clone of this stream returns `Ok(0)` afterwards.
    /// This is the only way to interrupt such a read.
    pub fn shutdown_read(&self) -> Result<()> {
        self.shutdown(Shutdown::Read)
    }

    /// Shut down the write half of the socket.
    pub fn shutdown_write(&self) -> Result<()> {
        self.shutdown(Shutdown::Write)
    }

    /// Shut down both halves and release this handle.
    pub fn close(self) -> Result<()> {
        self.shutdown(Shutdown::Both)
    }

    fn shutdown(&self, how: Shutdown) -> Result<()> {
        trace!(peer = %self.peer, ?how, "shutting down term stream");
        match self.inner.shutdown(how) {
            Ok(()) => Ok(()),
            // The peer already tore the connection down.
            Err(err) if err.kind() == ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl std::fmt::Debug for TermStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TermStream")
            .field("type", &"tcp")
            .field("peer", &self.peer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    fn pair() -> (TermStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = thread::spawn(move || TcpStream::connect(addr).unwrap());
        let (server, _) = listener.accept().unwrap();
        let client = client.join().unwrap();
        (TermStream::from_tcp(client).unwrap(), server)
    }

    #[test]
    fn read_write_roundtrip() {
        let (mut stream, mut server) = pair();

        stream.write_all(b"hello").unwrap();
        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");

        server.write_all(b"world").unwrap();
        stream.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"world");
    }

    #[test]
    fn shutdown_read_unblocks_reader_on_clone() {
        let (stream, _server) = pair();
        let mut reader = stream.try_clone().unwrap();

        let blocked = thread::spawn(move || {
            let mut buf = [0u8; 16];
            reader.read(&mut buf).unwrap()
        });

        thread::sleep(Duration::from_millis(50));
        stream.shutdown_read().unwrap();

        assert_eq!(blocked.join().unwrap(), 0);
    }

    #[test]
    fn close_signals_eof_to_peer() {
        let (stream, mut server) = pair();
        stream.close().unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(server.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn peer_addr_and_debug() {
        let (stream, server) = pair();
        assert_eq!(stream.peer_addr(), server.local_addr().unwrap());
        let dbg = format!("{stream:?}");
        assert!(dbg.contains("tcp"));
        assert!(stream.local_addr().is_ok());
    }

    #[test]
    fn timeouts_apply() {
        let (stream, _server) = pair();
        stream
            .set_read_timeout(Some(Duration::from_millis(10)))
            .unwrap();
        stream
            .set_write_timeout(Some(Duration::from_millis(10)))
            .unwrap();
        stream.set_nodelay(true).unwrap();
    }
}
