//! Connection state, session epoch and ordered observer notification.
//!
//! All fields live behind one mutex. Transitions are queued while the lock is
//! held and drained afterwards by whichever caller finds no drain running, so
//! observers see every transition exactly once and in the order it happened,
//! even when the session task and a caller on another thread race.

use crate::state::ConnectionState;

use std::collections::VecDeque;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, error, info};
use tokio::sync::oneshot;

type ObserverFn = dyn Fn(ConnectionState) + Send + Sync;

/// A connection-state callback.
///
/// Identity is by reference, like [`EventHandler`](crate::EventHandler).
#[derive(Clone)]
pub struct StateObserver(Arc<ObserverFn>);

impl StateObserver {
    pub fn new<F>(observer: F) -> Self
    where
        F: Fn(ConnectionState) + Send + Sync + 'static,
    {
        Self(Arc::new(observer))
    }

    /// Invoke the callback directly.
    pub fn notify(&self, state: ConnectionState) {
        (self.0)(state)
    }
}

impl PartialEq for StateObserver {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for StateObserver {}

impl fmt::Debug for StateObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateObserver({:p})", Arc::as_ptr(&self.0))
    }
}

pub(crate) struct LifecycleInner {
    state: ConnectionState,
    /// Bumped by every explicit connect/disconnect; a session may only
    /// transition while its epoch is current.
    epoch: u64,
    shutdown: Option<oneshot::Sender<()>>,
    /// Failures since the current epoch's last successful open.
    attempts: u32,
    observers: Vec<StateObserver>,
    pending: VecDeque<(ConnectionState, ConnectionState)>,
    draining: bool,
}

impl LifecycleInner {
    pub(crate) fn state(&self) -> ConnectionState {
        self.state
    }

    /// Start a new epoch, signalling the previous session (if any) to stop.
    pub(crate) fn begin_epoch(&mut self) -> u64 {
        self.epoch += 1;
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.epoch
    }

    pub(crate) fn reset_attempts(&mut self) {
        self.attempts = 0;
    }

    pub(crate) fn install_shutdown(&mut self, shutdown: oneshot::Sender<()>) {
        self.shutdown = Some(shutdown);
    }

    /// Change state and queue the notification. Repeating the current state is ignored.
    pub(crate) fn set_state(&mut self, next: ConnectionState) -> bool {
        if self.state == next {
            return false;
        }
        let previous = self.state;
        self.state = next;
        self.pending.push_back((previous, next));
        true
    }
}

pub(crate) struct Lifecycle {
    inner: Mutex<LifecycleInner>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(LifecycleInner {
                state: ConnectionState::Idle,
                epoch: 0,
                shutdown: None,
                attempts: 0,
                observers: Vec::new(),
                pending: VecDeque::new(),
                draining: false,
            }),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, LifecycleInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.lock().state
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.lock().attempts
    }

    /// Transition on behalf of the session that owns `epoch`.
    ///
    /// Returns `false` if the session has been superseded; the caller must stop.
    pub(crate) fn advance(&self, epoch: u64, next: ConnectionState) -> bool {
        self.transition(epoch, next, None)
    }

    /// Like [`advance`](Self::advance), also recording the session's retry
    /// count. A superseded session leaves the count untouched.
    pub(crate) fn advance_counting(
        &self,
        epoch: u64,
        next: ConnectionState,
        attempts: u32,
    ) -> bool {
        self.transition(epoch, next, Some(attempts))
    }

    fn transition(&self, epoch: u64, next: ConnectionState, attempts: Option<u32>) -> bool {
        {
            let mut inner = self.lock();
            if inner.epoch != epoch {
                debug!(
                    "Ignoring {next} from stale session (epoch {epoch}, current {})",
                    inner.epoch
                );
                return false;
            }
            if let Some(attempts) = attempts {
                inner.attempts = attempts;
            }
            inner.set_state(next);
        }
        self.flush();
        true
    }

    pub(crate) fn add_observer(&self, observer: StateObserver) {
        let mut inner = self.lock();
        if inner.observers.contains(&observer) {
            debug!("{observer:?} already registered");
            return;
        }
        inner.observers.push(observer);
    }

    pub(crate) fn remove_observer(&self, observer: &StateObserver) {
        self.lock().observers.retain(|registered| registered != observer);
    }

    /// Deliver queued transitions. Observers run without the lock held.
    pub(crate) fn flush(&self) {
        let mut inner = self.lock();
        if inner.draining {
            return;
        }
        inner.draining = true;

        while let Some((previous, next)) = inner.pending.pop_front() {
            let observers = inner.observers.clone();
            drop(inner);

            info!("Connection state: {previous} -> {next}");
            for observer in &observers {
                if catch_unwind(AssertUnwindSafe(|| observer.notify(next))).is_err() {
                    error!("{observer:?} panicked handling {next}");
                }
            }

            inner = self.lock();
        }

        inner.draining = false;
    }
}
