//! Named-event signal for test synchronization.
//!
//! Handlers raise a signal named after their event when test mode is on;
//! a test harness blocks in [`TestSignal::wait_for`] until it arrives.
//! Occurrences are counted, so a signal raised before the wait starts is
//! still observed, once.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::options::NotifyOptions;

/// Provider surface handlers call to raise a test signal.
pub trait ProviderSignal: Send + Sync {
    /// Raise `event_name` if the provider runs in test mode.
    fn signal_if_test_mode(&self, event_name: &str);

    /// Release anything blocked on this provider's signals.
    ///
    /// Called once at session teardown.
    fn release_waiters(&self) {}
}

#[derive(Debug, Default)]
struct SignalState {
    /// Occurrences not yet consumed, per event name.
    pending: HashMap<String, usize>,
    /// Set at session teardown.
    closed: bool,
}

impl SignalState {
    /// Consume one occurrence of `name`.
    fn take(&mut self, name: &str) -> bool {
        match self.pending.get_mut(name) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.pending.remove(name);
                true
            }
            None => false,
        }
    }
}

/// Counting wait/notify primitive keyed by event name.
#[derive(Debug)]
pub struct TestSignal {
    test_mode: bool,
    default_timeout: Duration,
    state: Mutex<SignalState>,
    cond: Condvar,
}

impl TestSignal {
    /// Default time [`TestSignal::wait`] blocks for.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a signal.
    ///
    /// # Arguments
    /// * `test_mode` - When false, `signal` is a no-op
    pub fn new(test_mode: bool) -> Self {
        Self {
            test_mode,
            default_timeout: Self::DEFAULT_TIMEOUT,
            state: Mutex::new(SignalState::default()),
            cond: Condvar::new(),
        }
    }

    /// Create a signal from provider options.
    pub fn from_options(options: &NotifyOptions) -> Self {
        Self::new(options.test_mode).with_default_timeout(options.signal_timeout)
    }

    /// Set the timeout used by [`TestSignal::wait`].
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Whether signals are recorded.
    pub fn is_test_mode(&self) -> bool {
        self.test_mode
    }

    /// Record one occurrence of `name` and wake waiters.
    ///
    /// No-op outside test mode or after [`TestSignal::close`].
    pub fn signal(&self, name: &str) {
        if !self.test_mode {
            return;
        }

        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            *state.pending.entry(name.to_string()).or_insert(0) += 1;
        }

        self.cond.notify_all();
    }

    /// Block until `name` has been signalled, consuming one occurrence.
    ///
    /// # Arguments
    /// * `name` - Event name to wait for
    /// * `timeout` - Maximum time to block
    ///
    /// # Returns
    /// True if an occurrence was consumed, false on timeout or after close.
    pub fn wait_for(&self, name: &str, timeout: Duration) -> bool {
        // None when the timeout is too large to represent: wait unbounded.
        let deadline: Option<Instant> = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();

        loop {
            if state.closed {
                return false;
            }
            if state.take(name) {
                return true;
            }
            match deadline {
                Some(deadline) => {
                    if self.cond.wait_until(&mut state, deadline).timed_out() {
                        return !state.closed && state.take(name);
                    }
                }
                None => self.cond.wait(&mut state),
            }
        }
    }

    /// [`TestSignal::wait_for`] with the configured default timeout.
    pub fn wait(&self, name: &str) -> bool {
        self.wait_for(name, self.default_timeout)
    }

    /// Occurrences of `name` not yet consumed.
    pub fn pending(&self, name: &str) -> usize {
        self.state.lock().pending.get(name).copied().unwrap_or(0)
    }

    /// Release every waiter and ignore further signals.
    pub fn close(&self) {
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.pending.clear();
        }

        tracing::debug!("Test signal closed");
        self.cond.notify_all();
    }

    /// Whether [`TestSignal::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl ProviderSignal for TestSignal {
    fn signal_if_test_mode(&self, event_name: &str) {
        self.signal(event_name);
    }

    fn release_waiters(&self) {
        self.close();
    }
}
