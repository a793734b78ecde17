//! One-shot timer scheduling for the debounce window
//!
//! The controller only needs "run this once after D, unless cancelled".
//! [`TokioScheduler`] provides that on a tokio runtime; [`ManualScheduler`]
//! queues callbacks until the host fires them, for hosts with their own clock
//! and for deterministic tests.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::trace;

use super::error::AimError;

/// Callback run when a timer expires
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a scheduled timer
pub trait PendingTimer: Send {
    /// Stop the timer if it has not fired yet
    fn cancel(&self);
}

/// Source of one-shot timers
pub trait Scheduler: Send + Sync {
    fn schedule_once(&self, delay: Duration, callback: TimerCallback) -> Box<dyn PendingTimer>;
}

/// Scheduler backed by tokio tasks
///
/// Holds a runtime handle, so it can be used from threads outside the runtime
/// (e.g. a blocking gamepad polling thread).
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime the caller is running in
    pub fn current() -> Result<Self, AimError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| AimError::NoRuntime)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_once(&self, delay: Duration, callback: TimerCallback) -> Box<dyn PendingTimer> {
        trace!("Scheduling timer in {:?}", delay);
        let task = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
        Box::new(TokioTimer(task.abort_handle()))
    }
}

struct TokioTimer(AbortHandle);

impl PendingTimer for TokioTimer {
    fn cancel(&self) {
        self.0.abort();
    }
}

/// Scheduler that runs callbacks only when told to
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Arc<Mutex<ManualQueue>>,
}

#[derive(Default)]
struct ManualQueue {
    next_id: u64,
    pending: Vec<ManualEntry>,
}

struct ManualEntry {
    id: u64,
    delay: Duration,
    callback: TimerCallback,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timers scheduled and not yet fired or cancelled
    pub fn pending(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Delays of the pending timers, oldest first
    pub fn pending_delays(&self) -> Vec<Duration> {
        self.inner.lock().pending.iter().map(|e| e.delay).collect()
    }

    /// Fire every pending timer, returning how many ran
    pub fn fire_all(&self) -> usize {
        let callbacks = self.take_pending();
        let count = callbacks.len();
        for callback in callbacks {
            callback();
        }
        count
    }

    /// Dequeue every pending callback without running it
    ///
    /// Mirrors a timer that has already expired but whose callback has not
    /// run yet; cancelling afterwards has no effect on the returned callbacks.
    pub fn take_pending(&self) -> Vec<TimerCallback> {
        let mut queue = self.inner.lock();
        queue.pending.drain(..).map(|e| e.callback).collect()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_once(&self, delay: Duration, callback: TimerCallback) -> Box<dyn PendingTimer> {
        let mut queue = self.inner.lock();
        queue.next_id += 1;
        let id = queue.next_id;
        queue.pending.push(ManualEntry {
            id,
            delay,
            callback,
        });

        Box::new(ManualTimer {
            id,
            queue: Arc::downgrade(&self.inner),
        })
    }
}

struct ManualTimer {
    id: u64,
    queue: Weak<Mutex<ManualQueue>>,
}

impl PendingTimer for ManualTimer {
    fn cancel(&self) {
        if let Some(queue) = self.queue.upgrade() {
            queue.lock().pending.retain(|e| e.id != self.id);
        }
    }
}
