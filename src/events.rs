//! Typed client events and synchronous multicast dispatch.
//!
//! The event set is fixed: `Open`, `Data`, `Error`, `Close`. Listeners are
//! invoked synchronously in subscription order, each transport event is
//! delivered at most once, and there is no buffering or replay for late
//! subscribers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::types::ResponseEnvelope;
use crate::Error;

/// Lifecycle and data events emitted by a client session.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// The duplex stream was established and listeners are attached. Emitted
    /// before the remote peer acknowledges anything.
    Open,
    /// An inbound response envelope arrived.
    Data(ResponseEnvelope),
    /// A failure surfaced outside any caller-visible call: a mid-stream
    /// transport error or a failed heartbeat write.
    Error(Arc<Error>),
    /// The session ended, either by `close()` or by the transport's own
    /// terminal signal.
    Close,
}

type Listener = Arc<dyn Fn(&ClientEvent) + Send + Sync>;
type ListenerTable = Mutex<Vec<(u64, Listener)>>;

/// Synchronous multicast dispatcher with ordered listener invocation.
///
/// Cloning an `EventBus` shares the listener table; the session and the
/// facade emit through the same bus.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<ListenerTable>,
    next_id: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; returns an explicit unsubscribe handle.
    ///
    /// Dropping the handle does not unsubscribe; call
    /// [`Subscription::unsubscribe`].
    pub fn subscribe(&self, listener: impl Fn(&ClientEvent) + Send + Sync + 'static) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut table) = self.listeners.lock() {
            table.push((id, Arc::new(listener)));
        }
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Deliver an event to every current listener, in subscription order.
    ///
    /// Listeners are snapshotted before invocation so a callback may
    /// subscribe or unsubscribe without deadlocking; such changes take
    /// effect from the next event.
    pub fn emit(&self, event: &ClientEvent) {
        let snapshot: Vec<Listener> = match self.listeners.lock() {
            Ok(table) => table.iter().map(|(_, l)| l.clone()).collect(),
            Err(_) => return,
        };
        for listener in snapshot {
            listener(event);
        }
    }

    #[cfg(test)]
    fn listener_count(&self) -> usize {
        self.listeners.lock().map(|t| t.len()).unwrap_or(0)
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    listeners: Weak<ListenerTable>,
}

impl Subscription {
    /// Remove the listener. Idempotent; a second call is a no-op.
    pub fn unsubscribe(&self) {
        if let Some(table) = self.listeners.upgrade() {
            if let Ok(mut table) = table.lock() {
                table.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_listeners_invoked_in_subscription_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = order.clone();
            bus.subscribe(move |_| order.lock().unwrap().push(tag));
        }

        bus.emit(&ClientEvent::Open);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = hits.clone();
        let sub = bus.subscribe(move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(&ClientEvent::Close);
        sub.unsubscribe();
        sub.unsubscribe(); // idempotent
        bus.emit(&ClientEvent::Close);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_subscribe_from_listener_does_not_deadlock() {
        let bus = EventBus::new();
        let inner_hits = Arc::new(AtomicUsize::new(0));

        let bus_clone = bus.clone();
        let inner = inner_hits.clone();
        bus.subscribe(move |_| {
            let inner = inner.clone();
            bus_clone.subscribe(move |_| {
                inner.fetch_add(1, Ordering::SeqCst);
            });
        });

        // First emit registers the nested listener but must not deliver to it.
        bus.emit(&ClientEvent::Open);
        assert_eq!(inner_hits.load(Ordering::SeqCst), 0);

        bus.emit(&ClientEvent::Close);
        assert_eq!(inner_hits.load(Ordering::SeqCst), 1);
    }
}
