//! Background receiver: one thread per session feeding the [`Inbox`].
//!
//! The thread spends almost all of its time blocked in a socket read. The
//! running flag is only looked at between telegrams, so stopping the thread
//! takes two steps: shut down the read half of the socket (the blocked read
//! returns zero bytes), then clear the flag and join. See
//! [`ReceiverHandle::stop`].

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use thales_frame::{FrameError, TelegramReader};
use tracing::{debug, trace, warn};

use crate::inbox::Inbox;

const THREAD_NAME: &str = "thales-receiver";

/// Owner side of a running receiver thread.
#[derive(Debug)]
pub struct ReceiverHandle {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

/// Start the receiver thread for `reader`, pushing into `inbox`.
pub fn spawn<R>(reader: TelegramReader<R>, inbox: Arc<Inbox>) -> std::io::Result<ReceiverHandle>
where
    R: Read + Send + 'static,
{
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);

    let thread = thread::Builder::new()
        .name(THREAD_NAME.to_string())
        .spawn(move || receive_loop(reader, &inbox, &flag))?;

    Ok(ReceiverHandle {
        running,
        thread: Some(thread),
    })
}

impl ReceiverHandle {
    /// Whether the thread is still receiving.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
            && self
                .thread
                .as_ref()
                .is_some_and(|thread| !thread.is_finished())
    }

    /// Clear the running flag and join the thread.
    ///
    /// Blocks until the thread exits, so the read it may be blocked in must
    /// already have been interrupted (read-half shutdown or peer close).
    pub fn stop(mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("receiver thread panicked");
            }
        }
    }
}

fn receive_loop<R: Read>(mut reader: TelegramReader<R>, inbox: &Inbox, running: &AtomicBool) {
    let mut received = 0u64;

    while running.load(Ordering::Acquire) {
        match reader.read_telegram() {
            Ok(telegram) if telegram.is_empty() => {
                trace!(
                    message_type = telegram.message_type(),
                    "discarding empty telegram"
                );
            }
            Ok(telegram) => {
                if !inbox.push(telegram) {
                    break;
                }
                received += 1;
            }
            Err(FrameError::ConnectionClosed) => {
                debug!(received, "term stream closed; receiver stopping");
                break;
            }
            Err(err) => {
                if running.load(Ordering::Acquire) {
                    warn!(error = %err, received, "receive failed; receiver stopping");
                } else {
                    debug!(error = %err, received, "receiver stopping after shutdown");
                }
                break;
            }
        }
    }

    inbox.close();
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, ErrorKind, Write};
    use std::net::{TcpListener, TcpStream};
    use std::time::{Duration, Instant};

    use bytes::BytesMut;
    use thales_frame::encode_telegram;
    use thales_transport::TermStream;

    use super::*;

    fn wire(telegrams: &[(u8, &[u8])]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for (message_type, payload) in telegrams {
            encode_telegram(*message_type, payload, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    fn tcp_pair() -> (TermStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (server, _) = listener.accept().unwrap();
        (TermStream::from_tcp(client).unwrap(), server)
    }

    fn wait_until(deadline: Duration, mut done: impl FnMut() -> bool) {
        let start = Instant::now();
        while !done() {
            assert!(start.elapsed() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn pushes_all_telegrams_in_order_then_closes() {
        let bytes = wire(&[(2, b"one"), (2, b""), (2, b"two"), (0x80, b"three")]);
        let inbox = Arc::new(Inbox::new());

        let handle = spawn(TelegramReader::new(Cursor::new(bytes)), Arc::clone(&inbox)).unwrap();
        wait_until(Duration::from_secs(5), || inbox.is_closed());

        let texts: Vec<String> = std::iter::from_fn(|| inbox.try_pop())
            .map(|t| t.text().into_owned())
            .collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        wait_until(Duration::from_secs(5), || !handle.is_running());
        handle.stop();
    }

    #[test]
    fn no_telegrams_closes_empty_inbox() {
        let inbox = Arc::new(Inbox::new());
        let handle = spawn(
            TelegramReader::new(Cursor::new(Vec::<u8>::new())),
            Arc::clone(&inbox),
        )
        .unwrap();

        assert!(inbox.wait().is_none());
        handle.stop();
    }

    #[test]
    fn read_shutdown_unblocks_and_stop_joins() {
        let (stream, mut server) = tcp_pair();
        let inbox = Arc::new(Inbox::new());
        let handle = spawn(
            TelegramReader::new(stream.try_clone().unwrap()),
            Arc::clone(&inbox),
        )
        .unwrap();

        server.write_all(&wire(&[(2, b"before")])).unwrap();
        assert_eq!(
            inbox.wait_timeout(Duration::from_secs(5)).unwrap().text(),
            "before"
        );
        assert!(handle.is_running());

        let start = Instant::now();
        stream.shutdown_read().unwrap();
        handle.stop();
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(inbox.is_closed());
    }

    #[test]
    fn peer_close_mid_telegram_pushes_nothing() {
        let (stream, mut server) = tcp_pair();
        let inbox = Arc::new(Inbox::new());
        let handle = spawn(TelegramReader::new(stream), Arc::clone(&inbox)).unwrap();

        server.write_all(&[0x10, 0x00, 0x02, b'p', b'a']).unwrap();
        drop(server);

        assert!(inbox.wait_timeout(Duration::from_secs(5)).is_none());
        assert!(inbox.is_closed());
        handle.stop();
    }

    #[test]
    fn read_error_ends_loop() {
        let inbox = Arc::new(Inbox::new());
        let handle = spawn(TelegramReader::new(FailingReader), Arc::clone(&inbox)).unwrap();

        assert!(inbox.wait().is_none());
        handle.stop();
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::ConnectionReset))
        }
    }
}
