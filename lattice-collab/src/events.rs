//! Per-peer named-event pub/sub.
//!
//! Peers use this to signal lifecycle events such as [`SYNC_EVENT`], which
//! fires once a reconnect has drained the offline queue and rebroadcast the
//! peer's state.
//!
//! Listeners are stored per event name with set semantics: registering the
//! same `Arc` twice on one event returns the original [`ListenerId`].
//! `emit` never mutates the bus, so a panicking listener unwinds to the
//! caller of `emit` and leaves the registration table intact.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Fired with `true` after a successful reconnect.
pub const SYNC_EVENT: &str = "sync";

/// Callback handle.
pub type Listener<P> = Arc<dyn Fn(&P) + Send + Sync>;

/// Returned by [`EventBus::on`], used to remove the listener later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Named-event fan-out to local listeners.
pub struct EventBus<P> {
    listeners: HashMap<String, Vec<(ListenerId, Listener<P>)>>,
    next_id: u64,
}

impl<P> EventBus<P> {
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
            next_id: 0,
        }
    }

    /// Register `listener` for `event`.
    pub fn on(&mut self, event: &str, listener: Listener<P>) -> ListenerId {
        let entries = self.listeners.entry(event.to_string()).or_default();

        if let Some((id, _)) = entries.iter().find(|(_, l)| Arc::ptr_eq(l, &listener)) {
            return *id;
        }

        self.next_id += 1;
        let id = ListenerId(self.next_id);
        entries.push((id, listener));
        id
    }

    /// Remove a listener. Returns whether anything was removed.
    pub fn off(&mut self, event: &str, id: ListenerId) -> bool {
        let Some(entries) = self.listeners.get_mut(event) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            self.listeners.remove(event);
        }
        removed
    }

    /// Invoke every listener for `event` once. Returns how many ran.
    pub fn emit(&self, event: &str, payload: &P) -> usize {
        let Some(entries) = self.listeners.get(event) else {
            return 0;
        };
        for (_, listener) in entries {
            listener(payload);
        }
        entries.len()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.get(event).map_or(0, Vec::len)
    }

    /// Drop all listeners for `event`.
    pub fn clear(&mut self, event: &str) {
        self.listeners.remove(event);
    }
}

impl<P> Default for EventBus<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for EventBus<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<&str, usize> = self
            .listeners
            .iter()
            .map(|(event, entries)| (event.as_str(), entries.len()))
            .collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, Listener<bool>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let listener: Listener<bool> = Arc::new(move |_: &bool| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        (hits, listener)
    }

    #[test]
    fn test_emit_invokes_each_listener_once() {
        let mut bus: EventBus<bool> = EventBus::new();
        let (a_hits, a) = counter();
        let (b_hits, b) = counter();
        bus.on(SYNC_EVENT, a);
        bus.on(SYNC_EVENT, b);

        assert_eq!(bus.emit(SYNC_EVENT, &true), 2);
        assert_eq!(a_hits.load(Ordering::SeqCst), 1);
        assert_eq!(b_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_double_registration_is_idempotent() {
        let mut bus: EventBus<bool> = EventBus::new();
        let (hits, listener) = counter();

        let first = bus.on(SYNC_EVENT, listener.clone());
        let second = bus.on(SYNC_EVENT, listener);
        assert_eq!(first, second);
        assert_eq!(bus.listener_count(SYNC_EVENT), 1);

        bus.emit(SYNC_EVENT, &true);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_same_listener_on_two_events() {
        let mut bus: EventBus<bool> = EventBus::new();
        let (hits, listener) = counter();
        bus.on("sync", listener.clone());
        bus.on("status", listener);

        bus.emit("sync", &true);
        bus.emit("status", &false);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_off_removes_listener() {
        let mut bus: EventBus<bool> = EventBus::new();
        let (hits, listener) = counter();
        let id = bus.on(SYNC_EVENT, listener);

        assert!(bus.off(SYNC_EVENT, id));
        assert_eq!(bus.emit(SYNC_EVENT, &true), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_off_unknown_is_noop() {
        let mut bus: EventBus<bool> = EventBus::new();
        let (_, listener) = counter();
        let id = bus.on("other", listener);

        assert!(!bus.off(SYNC_EVENT, id));
        assert_eq!(bus.listener_count("other"), 1);
    }

    #[test]
    fn test_emit_unknown_event() {
        let bus: EventBus<bool> = EventBus::new();
        assert_eq!(bus.emit("nothing", &true), 0);
    }

    #[test]
    fn test_payload_is_forwarded() {
        let mut bus: EventBus<bool> = EventBus::new();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let s = seen.clone();
        bus.on(SYNC_EVENT, Arc::new(move |synced: &bool| s.lock().unwrap().push(*synced)));

        bus.emit(SYNC_EVENT, &true);
        bus.emit(SYNC_EVENT, &false);
        assert_eq!(*seen.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn test_panicking_listener_propagates_and_bus_survives() {
        let mut bus: EventBus<bool> = EventBus::new();
        bus.on(SYNC_EVENT, Arc::new(|_: &bool| panic!("listener failed")) as Listener<bool>);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            bus.emit(SYNC_EVENT, &true);
        }));
        assert!(result.is_err());
        assert_eq!(bus.listener_count(SYNC_EVENT), 1);
    }

    #[test]
    fn test_clear() {
        let mut bus: EventBus<bool> = EventBus::new();
        let (_, listener) = counter();
        bus.on(SYNC_EVENT, listener);
        bus.clear(SYNC_EVENT);
        assert_eq!(bus.listener_count(SYNC_EVENT), 0);
    }
}
