use crate::future::{Payload, RiakFuture};
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};
use tracing::debug;

/// Single-shot completion callback. Receives the future that settled.
pub type Listener<T, Q> = Box<dyn FnOnce(&dyn RiakFuture<T, Q>) + Send + 'static>;

/// Handle returned by `add_listener`, used to remove the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct RegistryState<T: Payload, Q: Payload> {
    fired: bool,
    next_id: u64,
    listeners: HashMap<u64, Listener<T, Q>>,
}

/// Completion callbacks attached to a future.
///
/// Registration and firing share one lock, so a listener added
/// concurrently with completion is either stored and fired by `fire`, or
/// sees `fired == true` and runs immediately. It is never run twice and
/// never missed. Callbacks themselves always run outside the lock.
pub struct ListenerRegistry<T: Payload, Q: Payload> {
    state: Mutex<RegistryState<T, Q>>,
}

impl<T: Payload, Q: Payload> ListenerRegistry<T, Q> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                fired: false,
                next_id: 0,
                listeners: HashMap::new(),
            }),
        }
    }

    /// Stores `listener`, or invokes it right away with `subject` when the
    /// registry has already fired.
    pub fn add(&self, listener: Listener<T, Q>, subject: &dyn RiakFuture<T, Q>) -> ListenerId {
        let mut state = self.lock();
        let id = ListenerId(state.next_id);
        state.next_id += 1;

        if state.fired {
            drop(state);
            listener(subject);
        } else {
            state.listeners.insert(id.0, listener);
        }

        id
    }

    /// Removes a listener that has not fired yet.
    pub fn remove(&self, id: ListenerId) -> bool {
        self.lock().listeners.remove(&id.0).is_some()
    }

    /// Fires every stored listener once. Later calls are no-ops.
    pub fn fire(&self, subject: &dyn RiakFuture<T, Q>) -> usize {
        let listeners = {
            let mut state = self.lock();
            if state.fired {
                return 0;
            }
            state.fired = true;
            std::mem::take(&mut state.listeners)
        };

        let count = listeners.len();
        for (_, listener) in listeners {
            listener(subject);
        }

        debug!(listeners = count, "Notified completion listeners");
        count
    }

    pub fn is_fired(&self) -> bool {
        self.lock().fired
    }

    pub fn len(&self) -> usize {
        self.lock().listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState<T, Q>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Payload, Q: Payload> Default for ListenerRegistry<T, Q> {
    fn default() -> Self {
        Self::new()
    }
}
