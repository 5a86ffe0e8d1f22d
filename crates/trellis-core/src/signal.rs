//! Change notification channel.
//!
//! A [`Signal`] fans one value out to every connected slot.
//! [`ModelTree`](crate::ModelTree) owns a `Signal<ModelEvent>` and
//! emits on it after every structural or identity change; instance maps
//! subscribe to it to follow the tree.
//!
//! Slots run inline in [`Signal::emit`]. The slot list is copied out of the
//! lock first, so a slot may connect or disconnect slots (itself included)
//! while being invoked.
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use trellis_core::Signal;
//!
//! let renamed = Signal::<&'static str>::new();
//! let seen = Arc::new(AtomicUsize::new(0));
//!
//! let counter = seen.clone();
//! let id = renamed.connect(move |name| {
//!     counter.fetch_add(name.len(), Ordering::Relaxed);
//! });
//!
//! renamed.emit("pear");
//! renamed.disconnect(id);
//! renamed.emit("ignored");
//! assert_eq!(seen.load(Ordering::Relaxed), 4);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle of one connected slot, for [`Signal::disconnect`].
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A list of slots invoked with every emitted value.
pub struct Signal<Args> {
    slots: Mutex<SlotMap<ConnectionId, Slot<Args>>>,
}

impl<Args> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> std::fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("slots", &self.connection_count())
            .finish()
    }
}

impl<Args> Signal<Args> {
    /// Create a signal without slots.
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(SlotMap::with_key()),
        }
    }

    /// Add a slot. It stays connected until [`disconnect`](Self::disconnect).
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.slots.lock().insert(Arc::new(slot))
    }

    /// Add a slot for the lifetime of the returned guard.
    pub fn connect_scoped<F>(&self, slot: F) -> ConnectionGuard<'_, Args>
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        ConnectionGuard {
            signal: self,
            id: self.connect(slot),
        }
    }

    /// Remove a slot. Returns `false` if it was already gone.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.slots.lock().remove(id).is_some()
    }

    /// Number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.slots.lock().len()
    }

    /// Invoke every slot with `args`.
    pub fn emit(&self, args: Args) {
        let slots: Vec<Slot<Args>> = self.slots.lock().values().cloned().collect();
        if slots.is_empty() {
            return;
        }
        tracing::trace!(target: "trellis_core::signal", slots = slots.len(), "emit");
        for slot in &slots {
            slot(&args);
        }
    }
}

/// Disconnects its slot on drop. Created by [`Signal::connect_scoped`].
pub struct ConnectionGuard<'a, Args> {
    signal: &'a Signal<Args>,
    id: ConnectionId,
}

impl<Args> ConnectionGuard<'_, Args> {
    /// The guarded connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl<Args> Drop for ConnectionGuard<'_, Args> {
    fn drop(&mut self) {
        self.signal.disconnect(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(signal: &Signal<u32>) -> (ConnectionId, Arc<Mutex<Vec<u32>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let id = signal.connect(move |&n| sink.lock().push(n));
        (id, log)
    }

    #[test]
    fn every_slot_receives() {
        let signal = Signal::<u32>::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second"] {
            let order = order.clone();
            signal.connect(move |_| order.lock().push(tag));
        }

        signal.emit(0);
        assert_eq!(*order.lock(), vec!["first", "second"]);
    }

    #[test]
    fn disconnected_slot_stops_receiving() {
        let signal = Signal::<u32>::new();
        let (id, log) = recording(&signal);

        signal.emit(7);
        assert!(signal.disconnect(id));
        assert!(!signal.disconnect(id));
        signal.emit(8);

        assert_eq!(*log.lock(), vec![7]);
    }

    #[test]
    fn scoped_connection_ends_with_guard() {
        let signal = Signal::<u32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        {
            let sink = log.clone();
            let _guard = signal.connect_scoped(move |&n| sink.lock().push(n));
            assert_eq!(signal.connection_count(), 1);
            signal.emit(0);
        }
        signal.emit(1);

        assert_eq!(*log.lock(), vec![0]);
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn slot_can_disconnect_itself() {
        let signal = Arc::new(Signal::<u32>::new());
        let own = Arc::new(Mutex::new(None));

        let (weak_signal, own_clone) = (Arc::downgrade(&signal), own.clone());
        let id = signal.connect(move |_| {
            if let (Some(signal), Some(id)) = (weak_signal.upgrade(), *own_clone.lock()) {
                signal.disconnect(id);
            }
        });
        *own.lock() = Some(id);

        signal.emit(1);
        assert_eq!(signal.connection_count(), 0);
    }
}
