//! This module defines the [Inbox] and [Outbox] types for working with a
//! one-way SPSC (single producer single consumer) queue, useful in situations
//! with a single thread producing data and another single thread reading it.
//!
//! A channel made with [bounded] holds at most a fixed number of unreceived
//! messages. Sending into a full bounded channel never blocks, the message is
//! handed back to the caller inside [SendError] instead. This is what makes a
//! `bounded(1)` channel a good fit for reporting fatal errors: the first error
//! is kept and anything that follows is discarded.

use std::collections::VecDeque;
use std::fmt::{self, Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use thiserror::Error;

use super::{ChannelError, ChannelResult, THREAD_PANIC_MSG};

/// The inbox (message receiver) of a one-way message channel (single producer
/// single consumer queue). Also see [Outbox].
///
/// See [new] and [bounded] to construct.
#[derive(Debug)]
pub struct Inbox<T> {
    channel: Arc<OneWayChannel<T>>,
}

impl<T> Inbox<T> {
    /// Waits for a message from the outbox until one appears.
    ///
    /// A [ChannelError::ConnectionDropped] error is returned if the other end
    /// of the connection was dropped and there are no more items in the queue.
    ///
    /// Also see [Self::wait_timeout] and [Self::check].
    pub fn wait(&self) -> ChannelResult<T> {
        let mut queue = self.channel.queue.lock().expect(THREAD_PANIC_MSG);

        loop {
            if let Some(msg) = queue.pop_front() {
                return Ok(msg);
            }

            // No messages means either the other end hung up or this was a
            // spurious (early) wakeup and we should go back to sleep.
            self.channel.ensure_connected()?;

            queue = self.channel.notifier.wait(queue).expect(THREAD_PANIC_MSG);
        }
    }

    /// Waits for a message from the outbox for up to `timeout` time.
    ///
    /// After `timeout` time, a [ChannelError::Timeout] error is returned. Note
    /// that this function's execution may take slightly longer than `timeout`
    /// time.
    ///
    /// A [ChannelError::ConnectionDropped] error is returned if the other end
    /// of the connection was dropped and there are no more items in the queue.
    /// This is checked before the timeout, so a dropped outbox makes this
    /// return immediately.
    ///
    /// Also see [Self::wait] and [Self::check].
    pub fn wait_timeout(&self, timeout: Duration) -> ChannelResult<T> {
        let deadline = Instant::now() + timeout;
        let mut queue = self.channel.queue.lock().expect(THREAD_PANIC_MSG);

        loop {
            if let Some(msg) = queue.pop_front() {
                return Ok(msg);
            }

            self.channel.ensure_connected()?;

            let time_until_deadline = deadline.saturating_duration_since(Instant::now());
            if time_until_deadline.is_zero() {
                return Err(ChannelError::Timeout { timeout });
            }

            let (returned_queue, _) = self
                .channel
                .notifier
                .wait_timeout(queue, time_until_deadline)
                .expect(THREAD_PANIC_MSG);
            queue = returned_queue;
        }
    }

    /// Receives a message from the outbox if a message is waiting, returning
    /// [None] otherwise. This function may block briefly if the outbox is
    /// currently sending a message.
    ///
    /// A [ChannelError::ConnectionDropped] error is returned if the other end
    /// of the connection was dropped and there are no more items in the queue.
    pub fn check(&self) -> ChannelResult<Option<T>> {
        let mut queue = self.channel.queue.lock().expect(THREAD_PANIC_MSG);

        if let Some(msg) = queue.pop_front() {
            return Ok(Some(msg));
        }

        // If there are no messages we need to make sure the other end hasn't
        // hung up.
        self.channel.ensure_connected()?;

        Ok(None)
    }

    /// Whether the other party still has their end of the connection alive, the
    /// inverse of [Self::connection_closed].
    pub fn connection_open(&self) -> bool {
        self.channel.connected()
    }

    /// Whether the other party has dropped their end of the connection, the
    /// inverse of [Self::connection_open].
    pub fn connection_closed(&self) -> bool {
        !self.connection_open()
    }
}

impl<T> Drop for Inbox<T> {
    fn drop(&mut self) {
        self.channel.disconnect();
    }
}

/// The outbox (message sender) of a one-way message channel (single producer
/// single consumer queue). Also see [Inbox].
///
/// See [new] and [bounded] to construct.
#[derive(Debug)]
pub struct Outbox<T> {
    channel: Arc<OneWayChannel<T>>,
}

impl<T> Outbox<T> {
    /// Sends a message to the inbox, returning the number of messages that have
    /// been sent but not received (after sending the message). This never
    /// blocks waiting for the inbox to make room.
    ///
    /// The message is returned inside the error if the other end of the
    /// connection was dropped ([ChannelError::ConnectionDropped]) or if the
    /// channel is [bounded] and already full ([ChannelError::Full]).
    pub fn send(&self, msg: T) -> Result<usize, SendError<T>> {
        if let Err(reason) = self.channel.ensure_connected() {
            return Err(SendError { msg, reason });
        }

        let mut queue = self.channel.queue.lock().expect(THREAD_PANIC_MSG);

        if let Some(capacity) = self.channel.capacity
            && queue.len() >= capacity
        {
            return Err(SendError {
                msg,
                reason: ChannelError::Full { capacity },
            });
        }

        queue.push_back(msg);
        let in_flight = queue.len();

        // We need to notify the inbox that a message has arrived if it's
        // waiting.
        self.channel.notifier.notify_one();

        Ok(in_flight)
    }

    /// The number of messages that have been sent but not received.
    ///
    /// A [ChannelError::ConnectionDropped] error is returned if the other end
    /// of the connection was dropped.
    pub fn messages_in_flight(&self) -> ChannelResult<usize> {
        self.channel.ensure_connected()?;

        Ok(self.queue().len())
    }

    /// The maximum number of unreceived messages this channel will hold, or
    /// [None] if the channel is unbounded.
    pub fn capacity(&self) -> Option<usize> {
        self.channel.capacity
    }

    /// Whether the other party still has their end of the connection alive, the
    /// inverse of [Self::connection_closed].
    pub fn connection_open(&self) -> bool {
        self.channel.connected()
    }

    /// Whether the other party has dropped their end of the connection, the
    /// inverse of [Self::connection_open].
    pub fn connection_closed(&self) -> bool {
        !self.connection_open()
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.channel.queue.lock().expect(THREAD_PANIC_MSG)
    }
}

// We need a custom `Drop` implementation since the inbox may be waiting. We
// have to notify it that no more messages are coming so it doesn't just wait
// forever.
impl<T> Drop for Outbox<T> {
    fn drop(&mut self) {
        self.channel.disconnect();
    }
}

/// A message that couldn't be sent, along with the reason why.
#[derive(Error)]
#[error("{reason}")]
pub struct SendError<T> {
    /// The message that wasn't sent.
    pub msg: T,
    /// Either [ChannelError::ConnectionDropped] or [ChannelError::Full].
    pub reason: ChannelError,
}

impl<T> SendError<T> {
    /// Take back the message that wasn't sent.
    pub fn into_inner(self) -> T {
        self.msg
    }
}

// Written by hand so that `T` doesn't need to implement `Debug`.
impl<T> Debug for SendError<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendError")
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

/// Create an unbounded one-way message channel's [Inbox] and [Outbox].
///
/// - The inbox will be able to receive messages as long as the outbox hasn't
///   been dropped or while there are still pending messages.
/// - The outbox will be able to send messages as long as the inbox hasn't been
///   dropped.
pub fn new<T>() -> (Inbox<T>, Outbox<T>) {
    OneWayChannel {
        queue: Mutex::default(),
        notifier: Condvar::default(),
        capacity: None,
        disconnected: AtomicBool::new(false),
    }
    .into()
}

/// Create a one-way message channel's [Inbox] and [Outbox] that holds at most
/// `capacity` unreceived messages. Sends into a full channel fail with
/// [ChannelError::Full] instead of blocking.
///
/// If `capacity` is `0`, the thread will panic.
pub fn bounded<T>(capacity: usize) -> (Inbox<T>, Outbox<T>) {
    assert_ne!(capacity, 0, "A bounded channel needs room for a message.");

    OneWayChannel {
        queue: Mutex::new(VecDeque::with_capacity(capacity)),
        notifier: Condvar::default(),
        capacity: Some(capacity),
        disconnected: AtomicBool::new(false),
    }
    .into()
}

#[derive(Debug)]
struct OneWayChannel<T> {
    queue: Mutex<VecDeque<T>>,
    notifier: Condvar,
    capacity: Option<usize>,
    disconnected: AtomicBool,
}

impl<T> OneWayChannel<T> {
    fn connected(&self) -> bool {
        !self.disconnected.load(Ordering::Acquire)
    }

    fn ensure_connected(&self) -> ChannelResult<()> {
        if self.connected() {
            Ok(())
        } else {
            Err(ChannelError::ConnectionDropped)
        }
    }

    /// Marks the channel as disconnected and wakes anyone waiting on it.
    ///
    /// The flag is set while holding the queue lock. A waiter checks the flag
    /// with the lock held before going to sleep, so it can't miss the wakeup.
    fn disconnect(&self) {
        let _queue = self.queue.lock();
        self.disconnected.store(true, Ordering::Release);
        self.notifier.notify_all();
    }
}

impl<T> From<OneWayChannel<T>> for (Inbox<T>, Outbox<T>) {
    fn from(channel: OneWayChannel<T>) -> Self {
        let channel = Arc::new(channel);
        (
            Inbox {
                channel: channel.clone(),
            },
            Outbox { channel },
        )
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn messages_can_be_received() {
        let (inbox, outbox) = new::<i32>();

        let thread = thread::spawn(move || {
            assert!(outbox.send(1).is_ok());
            assert!(outbox.send(2).is_ok());
            assert!(outbox.send(3).is_ok());
        });

        assert_eq!(inbox.wait(), Ok(1));
        assert_eq!(inbox.wait(), Ok(2));
        assert_eq!(inbox.wait(), Ok(3));

        thread.join().unwrap();
    }

    #[test]
    fn timeout_works() {
        let (inbox, outbox) = new::<i32>();

        assert!(outbox.send(1).is_ok());

        let timeout = Duration::from_millis(100);
        assert_eq!(inbox.wait_timeout(timeout), Ok(1));
        assert_eq!(
            inbox.wait_timeout(timeout),
            Err(ChannelError::Timeout { timeout })
        );
    }

    #[test]
    fn check_works() {
        let (inbox, outbox) = new::<i32>();

        assert_eq!(inbox.check(), Ok(None));
        assert_eq!(outbox.send(7).ok(), Some(1));
        assert_eq!(inbox.check(), Ok(Some(7)));
        assert_eq!(inbox.check(), Ok(None));
    }

    #[test]
    fn bounded_channel_keeps_first_messages() {
        let (inbox, outbox) = bounded::<&str>(1);

        assert_eq!(outbox.capacity(), Some(1));
        assert_eq!(outbox.send("first").ok(), Some(1));

        let rejected = outbox.send("second").unwrap_err();
        assert_eq!(rejected.reason, ChannelError::Full { capacity: 1 });
        assert_eq!(rejected.into_inner(), "second");

        assert_eq!(inbox.check(), Ok(Some("first")));
        assert_eq!(inbox.check(), Ok(None));

        // There's room again now that the first message was received.
        assert_eq!(outbox.send("third").ok(), Some(1));
        assert_eq!(inbox.check(), Ok(Some("third")));
    }

    #[test]
    fn dropped_outbox_wakes_waiting_inbox() {
        let (inbox, outbox) = new::<i32>();

        let thread = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            drop(outbox);
        });

        assert_eq!(inbox.wait(), Err(ChannelError::ConnectionDropped));
        assert!(inbox.connection_closed());

        thread.join().unwrap();
    }

    #[test]
    fn pending_messages_survive_dropped_outbox() {
        let (inbox, outbox) = new::<i32>();

        assert!(outbox.send(4).is_ok());
        drop(outbox);

        assert_eq!(inbox.wait_timeout(Duration::from_millis(10)), Ok(4));
        assert_eq!(
            inbox.wait_timeout(Duration::from_millis(10)),
            Err(ChannelError::ConnectionDropped)
        );
    }

    #[test]
    fn sending_to_dropped_inbox_fails() {
        let (inbox, outbox) = new::<i32>();
        drop(inbox);

        let err = outbox.send(1).unwrap_err();
        assert_eq!(err.reason, ChannelError::ConnectionDropped);
        assert!(outbox.connection_closed());
    }
}
