use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use thales_frame::{Telegram, TelegramReader, TelegramWriter, CONTROL, DISCONNECT_PAYLOAD};
use thales_transport::TermStream;
use tracing::{debug, info, trace, warn};

use crate::config::ConnectionConfig;
use crate::error::{ConnectionError, Result};
use crate::inbox::Inbox;
use crate::receiver::{self, ReceiverHandle};
use crate::state::ConnectionState;

/// A session with Term.
///
/// All operations take `&self`, so one connection can be shared between
/// threads (e.g. behind an `Arc`). Sends are serialized internally. Replies
/// carry no request id: when several threads wait at once, which of them
/// receives a given telegram is unspecified. Callers that need request/reply
/// pairing must serialize their exchanges and clear stale telegrams first
/// with [`Connection::clear_incoming_telegram_queue`].
#[derive(Debug)]
pub struct Connection {
    config: ConnectionConfig,
    state: Mutex<ConnectionState>,
    session: Mutex<Option<Session>>,
}

#[derive(Debug)]
struct Session {
    /// Control handle used for the half shutdowns and the final close.
    stream: TermStream,
    writer: Arc<Mutex<TelegramWriter<TermStream>>>,
    inbox: Arc<Inbox>,
    receiver: ReceiverHandle,
    name: String,
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection {
    /// A disconnected connection with default configuration.
    pub fn new() -> Self {
        Self::with_config(ConnectionConfig::default())
    }

    /// A disconnected connection with explicit configuration.
    pub fn with_config(config: ConnectionConfig) -> Self {
        Self {
            config,
            state: Mutex::new(ConnectionState::Disconnected),
            session: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Whether the background receiver is still reading from Term.
    ///
    /// Turns false once Term closes the stream, even before `disconnect`.
    pub fn is_receiving(&self) -> bool {
        self.with_session(|session| session.receiver.is_running())
            .unwrap_or(false)
    }

    /// Address of the connected Term endpoint.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.with_session(|session| session.stream.peer_addr()).ok()
    }

    /// Session name sent in the handshake.
    pub fn session_name(&self) -> Option<String> {
        self.with_session(|session| session.name.clone()).ok()
    }

    /// Connect to Term at `address` and open a session named `session_name`.
    ///
    /// Success means the handshake bytes were written and the configured
    /// setup delay has passed; Term sends no acknowledgement. On failure
    /// nothing is retained and the connection is back to `Disconnected`.
    pub fn connect(&self, address: &str, session_name: &str) -> Result<()> {
        self.transition(
            ConnectionState::Disconnected,
            ConnectionState::Connecting,
            "connect",
        )?;

        match self.open_session(address, session_name) {
            Ok(session) => {
                info!(
                    peer = %session.stream.peer_addr(),
                    session = session_name,
                    "session established"
                );
                *self.session.lock() = Some(session);
                self.set_state(ConnectionState::Connected);
                Ok(())
            }
            Err(err) => {
                warn!(address, error = %err, "connect failed");
                self.set_state(ConnectionState::Disconnected);
                Err(err)
            }
        }
    }

    fn open_session(&self, address: &str, session_name: &str) -> Result<Session> {
        let stream = self.config.connector().connect(address)?;
        let frame_config = self.config.frame_config();

        let reader = TelegramReader::with_config_term(stream.try_clone()?, &frame_config)?;
        let writer = TelegramWriter::with_config_term(stream.try_clone()?, &frame_config)?;
        let inbox = Arc::new(Inbox::new());

        // Term may answer before the handshake write returns.
        let receiver =
            receiver::spawn(reader, Arc::clone(&inbox)).map_err(ConnectionError::ReceiverSpawn)?;

        let session = Session {
            stream,
            writer: Arc::new(Mutex::new(writer)),
            inbox,
            receiver,
            name: session_name.to_string(),
        };

        pause(self.config.settle_delay);

        let handshake = session.writer.lock().send_handshake(session_name);
        if let Err(err) = handshake {
            session.teardown();
            return Err(err.into());
        }
        debug!(session = session_name, "handshake sent");

        pause(self.config.session_setup_delay);
        Ok(session)
    }

    /// Close the session.
    ///
    /// Sends the disconnect telegram, shuts down the read half so the
    /// receiver's blocked read returns, joins the receiver and closes the
    /// socket. Threads blocked in [`Connection::wait_for_telegram`] resolve
    /// with [`ConnectionError::Closed`].
    pub fn disconnect(&self) -> Result<()> {
        self.transition(
            ConnectionState::Connected,
            ConnectionState::Disconnecting,
            "disconnect",
        )?;

        let session = self.session.lock().take();
        if let Some(session) = session {
            let name = session.name.clone();
            session.close(self.config.goodbye_timeout);
            info!(session = %name, "session closed");
        }

        self.set_state(ConnectionState::Disconnected);
        Ok(())
    }

    /// Send one telegram. Does not wait for anything.
    pub fn send_telegram(&self, payload: impl AsRef<[u8]>, message_type: u8) -> Result<()> {
        let writer = self.with_session(|session| Arc::clone(&session.writer))?;
        let mut writer = writer.lock();
        writer.send(message_type, payload.as_ref())?;
        Ok(())
    }

    /// Send a telegram and block until the next telegram arrives.
    ///
    /// The reply is simply the oldest queued telegram: if something was
    /// already queued, that is returned instead of the answer to this
    /// request.
    pub fn send_and_wait_for_reply(
        &self,
        payload: impl AsRef<[u8]>,
        message_type: u8,
    ) -> Result<Telegram> {
        self.send_telegram(payload, message_type)?;
        self.wait_for_telegram()
    }

    /// Like [`Connection::send_and_wait_for_reply`], bounded by `timeout`.
    pub fn send_and_wait_for_reply_timeout(
        &self,
        payload: impl AsRef<[u8]>,
        message_type: u8,
        timeout: Duration,
    ) -> Result<Option<Telegram>> {
        self.send_telegram(payload, message_type)?;
        self.wait_for_telegram_timeout(timeout)
    }

    /// Block until a telegram is available and return the oldest one.
    ///
    /// Fails with [`ConnectionError::Closed`] once the receiver has stopped
    /// and the queue is empty.
    pub fn wait_for_telegram(&self) -> Result<Telegram> {
        let inbox = self.inbox()?;
        inbox.wait().ok_or(ConnectionError::Closed)
    }

    /// Block until a telegram is available or `timeout` has elapsed.
    ///
    /// `Ok(None)` means the timeout expired.
    pub fn wait_for_telegram_timeout(&self, timeout: Duration) -> Result<Option<Telegram>> {
        let inbox = self.inbox()?;
        match inbox.wait_timeout(timeout) {
            Some(telegram) => Ok(Some(telegram)),
            None if inbox.is_closed() && inbox.is_empty() => Err(ConnectionError::Closed),
            None => Ok(None),
        }
    }

    /// Pop the oldest telegram without blocking.
    pub fn receive_telegram(&self) -> Result<Option<Telegram>> {
        Ok(self.inbox()?.try_pop())
    }

    /// Whether at least one telegram is queued.
    pub fn telegram_received(&self) -> bool {
        self.with_session(|session| !session.inbox.is_empty())
            .unwrap_or(false)
    }

    /// Number of queued telegrams.
    pub fn queued_telegrams(&self) -> usize {
        self.with_session(|session| session.inbox.len())
            .unwrap_or(0)
    }

    /// Discard all queued telegrams. Telegrams arriving later are kept.
    pub fn clear_incoming_telegram_queue(&self) {
        if let Ok(inbox) = self.inbox() {
            let dropped = inbox.clear();
            trace!(dropped, "incoming telegram queue cleared");
        }
    }

    fn inbox(&self) -> Result<Arc<Inbox>> {
        self.with_session(|session| Arc::clone(&session.inbox))
    }

    fn with_session<T>(&self, f: impl FnOnce(&Session) -> T) -> Result<T> {
        self.session
            .lock()
            .as_ref()
            .map(f)
            .ok_or(ConnectionError::NotConnected)
    }

    fn transition(
        &self,
        from: ConnectionState,
        to: ConnectionState,
        operation: &'static str,
    ) -> Result<()> {
        let mut state = self.state.lock();
        if *state != from {
            if from == ConnectionState::Connected && *state == ConnectionState::Disconnected {
                return Err(ConnectionError::NotConnected);
            }
            return Err(ConnectionError::InvalidState {
                operation,
                state: *state,
            });
        }
        trace!(%from, %to, "connection state change");
        *state = to;
        Ok(())
    }

    fn set_state(&self, to: ConnectionState) {
        let mut state = self.state.lock();
        trace!(from = %*state, %to, "connection state change");
        *state = to;
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.is_connected() {
            if let Err(err) = self.disconnect() {
                warn!(error = %err, "disconnect on drop failed");
            }
        }
    }
}

impl Session {
    /// Orderly shutdown: goodbye telegram first, then [`Session::teardown`].
    ///
    /// A sender stuck on a peer that stopped reading holds the writer lock.
    /// After `lock_timeout` the goodbye is skipped; the final close then
    /// fails that sender's write.
    fn close(self, lock_timeout: Duration) {
        match self.writer.try_lock_for(lock_timeout) {
            Some(mut writer) => {
                if let Err(err) = writer.send(CONTROL, &DISCONNECT_PAYLOAD) {
                    warn!(error = %err, "failed sending disconnect telegram");
                }
            }
            None => warn!(
                timeout = ?lock_timeout,
                "writer busy, skipping disconnect telegram"
            ),
        }
        self.teardown();
    }

    /// Stop the receiver and close the socket.
    ///
    /// The read half goes down before the join: the receiver is usually
    /// blocked in a read that only the shutdown can end.
    fn teardown(self) {
        if let Err(err) = self.stream.shutdown_read() {
            warn!(error = %err, "read shutdown failed");
        }
        self.receiver.stop();
        self.inbox.close();

        drop(self.writer);
        if let Err(err) = self.stream.close() {
            debug!(error = %err, "socket close reported an error");
        }
    }
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}
