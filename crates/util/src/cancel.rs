//! Defines [CancelToken], a cloneable, one-shot cancellation signal that a
//! worker thread can sleep on.
//!
//! Unlike polling an atomic flag between sleeps, waiting on a [CancelToken]
//! (see [CancelToken::wait_timeout] and [CancelToken::wait_until]) wakes up as
//! soon as [CancelToken::cancel] is called, so a worker sleeping until its next
//! deadline stops right away instead of at the end of its sleep.

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

const THREAD_PANIC_MSG: &str = "Another thread panicked while holding the cancellation lock.";

/// A one-shot cancellation signal shared between an owner and the threads it
/// wants to be able to stop.
///
/// Cloning the token gives another handle to the *same* signal. Once cancelled
/// a token stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    state: Arc<CancelState>,
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: Mutex<bool>,
    notifier: Condvar,
}

impl CancelToken {
    /// Create a token that hasn't been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal, waking every thread currently waiting on it. Calling
    /// this more than once does nothing.
    pub fn cancel(&self) {
        let mut cancelled = self.state.cancelled.lock().expect(THREAD_PANIC_MSG);
        if !*cancelled {
            *cancelled = true;
            self.state.notifier.notify_all();
        }
    }

    /// Whether [Self::cancel] has been called on this token (or a clone of it).
    pub fn is_cancelled(&self) -> bool {
        *self.state.cancelled.lock().expect(THREAD_PANIC_MSG)
    }

    /// Sleep for up to `timeout`, returning early if the token is cancelled.
    ///
    /// Returns whether the token is cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.wait_until(Instant::now() + timeout)
    }

    /// Sleep until `deadline`, returning early if the token is cancelled. A
    /// deadline in the past doesn't sleep at all.
    ///
    /// Returns whether the token is cancelled.
    pub fn wait_until(&self, deadline: Instant) -> bool {
        let mut cancelled = self.state.cancelled.lock().expect(THREAD_PANIC_MSG);

        loop {
            if *cancelled {
                return true;
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }

            // Spurious wakeups just go around the loop again.
            (cancelled, _) = self
                .state
                .notifier
                .wait_timeout(cancelled, remaining)
                .expect(THREAD_PANIC_MSG);
        }
    }
}
