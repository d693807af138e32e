//! Listener registry with per-listener failure isolation.
//!
//! Listeners are invoked synchronously in registration order. A panicking
//! listener is logged and skipped; the remaining listeners are still
//! notified and the transition that triggered the fan-out is unaffected.

use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

use crate::error::PlaybackError;

/// Handle returned when registering a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

pub(crate) struct ListenerRegistry<L: ?Sized> {
    next_id: AtomicU64,
    entries: RwLock<Vec<(ListenerId, Arc<L>)>>,
}

impl<L: ?Sized> ListenerRegistry<L> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn add(&self, listener: Arc<L>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.write().push((id, listener));
        id
    }

    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(candidate, _)| *candidate != id);
        entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Invoke `notify` on every listener and return the failures.
    ///
    /// The registry lock is not held while listeners run, so a listener may
    /// register or unregister listeners from inside its callback.
    pub(crate) fn notify<F>(&self, event: &'static str, notify: F) -> Vec<PlaybackError>
    where
        F: Fn(&L),
    {
        let snapshot: Vec<(ListenerId, Arc<L>)> = self
            .entries
            .read()
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect();

        let mut failures = Vec::new();
        for (id, listener) in snapshot {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| notify(listener.as_ref()))) {
                let failure = PlaybackError::ListenerFailure {
                    listener: id.value(),
                    event,
                    message: panic_message(payload.as_ref()),
                };
                warn!(error = %failure, "Listener failed; continuing fan-out");
                failures.push(failure);
            }
        }
        failures
    }
}

impl<L: ?Sized> Default for ListenerRegistry<L> {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
