//! Observable state primitives
//!
//! Push-based replacements for the reactive-property layer presentation
//! code binds to. `Property` holds a current value and notifies subscribers
//! on distinct changes; `Signal` is notification-only. Each engine is the
//! single writer of its own properties; readers only take snapshots.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle identifying a subscription
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscriptionId(u64);

struct Subscribers<T> {
    entries: Mutex<Vec<(u64, Callback<T>)>>,
    next_id: AtomicU64,
}

impl<T> Subscribers<T> {
    fn new() -> Self {
        Subscribers {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn add(&self, callback: Callback<T>) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().push((id, callback));
        SubscriptionId(id)
    }

    fn remove(&self, id: SubscriptionId) {
        self.entries.lock().retain(|(entry_id, _)| *entry_id != id.0);
    }

    fn snapshot(&self) -> Vec<Callback<T>> {
        self.entries
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect()
    }
}

/// Observable value with distinct-until-changed notification
///
/// Callbacks run on the mutating thread, after the value lock has been
/// released; they must not call back into the publishing engine.
pub struct Property<T> {
    value: RwLock<T>,
    subscribers: Subscribers<T>,
}

impl<T: Clone + PartialEq> Property<T> {
    pub fn new(initial: T) -> Self {
        Property {
            value: RwLock::new(initial),
            subscribers: Subscribers::new(),
        }
    }

    /// Snapshot of the current value
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Set the value, notifying subscribers only when it actually changed
    pub fn set(&self, value: T) {
        {
            let mut guard = self.value.write();
            if *guard == value {
                return;
            }
            *guard = value.clone();
        }
        for callback in self.subscribers.snapshot() {
            callback(&value);
        }
    }

    /// Register a change callback
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        self.subscribers.add(Arc::new(callback))
    }

    /// Drop a previously registered callback
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.remove(id);
    }
}

/// Notification-only stream with no retained value
pub struct Signal<T> {
    subscribers: Subscribers<T>,
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Signal {
            subscribers: Subscribers::new(),
        }
    }

    /// Push a notification to every subscriber
    pub fn emit(&self, value: &T) {
        for callback in self.subscribers.snapshot() {
            callback(value);
        }
    }

    /// Register a notification callback
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        self.subscribers.add(Arc::new(callback))
    }

    /// Drop a previously registered callback
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.remove(id);
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}
