use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use thales_frame::Telegram;

/// FIFO of received telegrams shared by the receiver and its consumers.
///
/// The receiver thread is the only producer. Any number of threads may
/// consume, but which of several concurrent waiters gets a given telegram is
/// unspecified; request/reply exchanges must be serialized by the caller.
///
/// Once closed (the receiver stopped) no more telegrams are accepted, and
/// waiters return as soon as the queue is drained.
#[derive(Debug, Default)]
pub struct Inbox {
    state: Mutex<InboxState>,
    available: Condvar,
}

#[derive(Debug, Default)]
struct InboxState {
    queue: VecDeque<Telegram>,
    closed: bool,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a telegram and wake waiters.
    ///
    /// Returns `false` (and drops the telegram) if the inbox is closed.
    pub fn push(&self, telegram: Telegram) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        state.queue.push_back(telegram);
        drop(state);
        self.available.notify_all();
        true
    }

    /// Stop accepting telegrams and wake every waiter.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Pop the oldest telegram without blocking.
    pub fn try_pop(&self) -> Option<Telegram> {
        self.state.lock().queue.pop_front()
    }

    /// Block until a telegram is available and pop it.
    ///
    /// Returns `None` only when the inbox is closed and empty.
    pub fn wait(&self) -> Option<Telegram> {
        let mut state = self.state.lock();
        loop {
            if let Some(telegram) = state.queue.pop_front() {
                return Some(telegram);
            }
            if state.closed {
                return None;
            }
            self.available.wait(&mut state);
        }
    }

    /// Block until a telegram is available or `timeout` has elapsed.
    ///
    /// Returns `None` on timeout, or earlier if the inbox is closed and
    /// empty. Wakeups without data go back to waiting for whatever is left
    /// of the deadline.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Telegram> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.wait();
        };

        let mut state = self.state.lock();
        loop {
            if let Some(telegram) = state.queue.pop_front() {
                return Some(telegram);
            }
            if state.closed {
                return None;
            }
            if self.available.wait_until(&mut state, deadline).timed_out() {
                return state.queue.pop_front();
            }
        }
    }

    /// Discard every queued telegram. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut state = self.state.lock();
        let dropped = state.queue.len();
        state.queue.clear();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    fn telegram(text: &'static str) -> Telegram {
        Telegram::new(2, text).unwrap()
    }

    #[test]
    fn fifo_order() {
        let inbox = Inbox::new();
        for text in ["a", "b", "c"] {
            assert!(inbox.push(telegram(text)));
        }

        assert_eq!(inbox.len(), 3);
        assert_eq!(inbox.try_pop().unwrap().text(), "a");
        assert_eq!(inbox.wait().unwrap().text(), "b");
        assert_eq!(
            inbox
                .wait_timeout(Duration::from_millis(1))
                .unwrap()
                .text(),
            "c"
        );
        assert!(inbox.is_empty());
    }

    #[test]
    fn try_pop_on_empty_returns_none() {
        let inbox = Inbox::new();
        assert!(inbox.try_pop().is_none());
    }

    #[test]
    fn clear_discards_only_existing_entries() {
        let inbox = Inbox::new();
        inbox.push(telegram("stale-1"));
        inbox.push(telegram("stale-2"));

        assert_eq!(inbox.clear(), 2);
        assert!(inbox.is_empty());

        inbox.push(telegram("fresh"));
        assert_eq!(inbox.try_pop().unwrap().text(), "fresh");
    }

    #[test]
    fn wait_timeout_on_empty_waits_full_duration() {
        let inbox = Inbox::new();
        let timeout = Duration::from_millis(150);

        let start = Instant::now();
        assert!(inbox.wait_timeout(timeout).is_none());
        let elapsed = start.elapsed();

        assert!(elapsed >= timeout, "returned after {elapsed:?}");
        assert!(elapsed < timeout + Duration::from_secs(1));
    }

    #[test]
    fn wait_timeout_returns_on_arrival() {
        let inbox = Arc::new(Inbox::new());
        let producer = {
            let inbox = Arc::clone(&inbox);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                inbox.push(telegram("late"));
            })
        };

        let start = Instant::now();
        let received = inbox.wait_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(received.text(), "late");
        assert!(start.elapsed() < Duration::from_secs(5));

        producer.join().unwrap();
    }

    #[test]
    fn wait_blocks_until_push() {
        let inbox = Arc::new(Inbox::new());
        let consumer = {
            let inbox = Arc::clone(&inbox);
            thread::spawn(move || inbox.wait())
        };

        thread::sleep(Duration::from_millis(50));
        inbox.push(telegram("wake"));

        assert_eq!(consumer.join().unwrap().unwrap().text(), "wake");
    }

    #[test]
    fn close_wakes_all_waiters() {
        let inbox = Arc::new(Inbox::new());
        let waiters: Vec<_> = (0..3)
            .map(|i| {
                let inbox = Arc::clone(&inbox);
                thread::spawn(move || {
                    if i == 0 {
                        inbox.wait_timeout(Duration::from_secs(30))
                    } else {
                        inbox.wait()
                    }
                })
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        inbox.close();

        for waiter in waiters {
            assert!(waiter.join().unwrap().is_none());
        }
        assert!(inbox.is_closed());
    }

    #[test]
    fn closed_inbox_drains_before_reporting_closed() {
        let inbox = Inbox::new();
        inbox.push(telegram("last"));
        inbox.close();

        assert!(!inbox.push(telegram("rejected")));
        assert_eq!(inbox.wait().unwrap().text(), "last");
        assert!(inbox.wait().is_none());
    }

    #[test]
    fn several_waiters_each_get_one() {
        let inbox = Arc::new(Inbox::new());
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let inbox = Arc::clone(&inbox);
                thread::spawn(move || inbox.wait_timeout(Duration::from_secs(10)))
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        for text in ["1", "2", "3", "4"] {
            inbox.push(telegram(text));
        }

        let mut got: Vec<String> = waiters
            .into_iter()
            .map(|w| w.join().unwrap().unwrap().text().into_owned())
            .collect();
        got.sort();
        assert_eq!(got, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn huge_timeout_falls_back_to_blocking_wait() {
        let inbox = Inbox::new();
        inbox.push(telegram("now"));
        assert_eq!(inbox.wait_timeout(Duration::MAX).unwrap().text(), "now");
    }
}
