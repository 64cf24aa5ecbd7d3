use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use tracing::{debug, trace};

use crate::event::WorkflowEvent;

/// Callback invoked synchronously for every emitted event.
pub type Listener = Arc<dyn Fn(&WorkflowEvent) + Send + Sync>;

/// Identifier assigned to each registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

#[derive(Default)]
struct Registry {
    listeners: RwLock<Vec<(SubscriberId, Listener)>>,
    next_id: AtomicU64,
}

impl Registry {
    fn remove(&self, id: SubscriberId) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        before != listeners.len()
    }

    fn snapshot(&self) -> Vec<Listener> {
        self.listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect()
    }

    fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

/// Fan-out publish/subscribe channel connecting event producers to listeners.
///
/// Clones share the same listener registry. Delivery is synchronous and in
/// registration order; nothing is buffered or replayed, so a listener only
/// sees events emitted after it subscribed.
///
/// `emit` iterates over a snapshot of the listeners taken when it starts:
/// a listener removed mid-emit still receives the in-flight event, and a
/// listener added mid-emit first sees the next one. Listeners may subscribe
/// or unsubscribe from inside their callback.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Registry>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. The returned handle removes it again.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&WorkflowEvent) + Send + Sync + 'static,
    {
        let id = SubscriberId(self.registry.next_id.fetch_add(1, Ordering::Relaxed));
        self.registry
            .listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((id, Arc::new(listener)));
        debug!(subscriber = id.0, "Listener subscribed");

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
            active: AtomicBool::new(true),
        }
    }

    /// Deliver an event to every listener registered when the call begins.
    ///
    /// Returns the number of listeners invoked.
    pub fn emit(&self, event: &WorkflowEvent) -> usize {
        let listeners = self.registry.snapshot();
        trace!(
            agent = %event.agent,
            status = %event.status,
            listeners = listeners.len(),
            "Emitting event"
        );
        for listener in &listeners {
            listener(event);
        }
        listeners.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Capability to remove one registered listener.
///
/// Dropping the handle does not unsubscribe.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    registry: Weak<Registry>,
    active: AtomicBool,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Remove the listener. Calling this more than once is a no-op.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            if registry.remove(self.id) {
                debug!(subscriber = self.id.0, "Listener unsubscribed");
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("listeners", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventStatus;
    use chrono::Utc;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    fn event(message: &str) -> WorkflowEvent {
        WorkflowEvent::system(EventStatus::Running, message, Utc::now())
    }

    fn counter(bus: &EventBus) -> (Arc<AtomicUsize>, Subscription) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let sub = bus.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (count, sub)
    }

    #[test]
    fn test_emit_reaches_all_subscribers_in_order() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s1 = Arc::clone(&seen);
        let _a = bus.subscribe(move |e| s1.lock().unwrap().push(format!("a:{}", e.message)));
        let s2 = Arc::clone(&seen);
        let _b = bus.subscribe(move |e| s2.lock().unwrap().push(format!("b:{}", e.message)));

        assert_eq!(bus.emit(&event("one")), 2);
        assert_eq!(*seen.lock().unwrap(), vec!["a:one", "b:one"]);
    }

    #[test]
    fn test_no_replay_for_late_subscribers() {
        let bus = EventBus::new();
        bus.emit(&event("early"));

        let (count, _sub) = counter(&bus);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        bus.emit(&event("late"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_before_emit_stops_delivery() {
        let bus = EventBus::new();
        let (count, sub) = counter(&bus);

        sub.unsubscribe();
        assert_eq!(bus.emit(&event("x")), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let bus = EventBus::new();
        let (_count_a, a) = counter(&bus);
        let (count_b, _b) = counter(&bus);

        a.unsubscribe();
        a.unsubscribe();
        assert!(!a.is_active());
        assert_eq!(bus.subscriber_count(), 1);

        bus.emit(&event("x"));
        assert_eq!(count_b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_same_closure_registered_twice_is_removed_once() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let make = |c: Arc<AtomicUsize>| {
            move |_: &WorkflowEvent| {
                c.fetch_add(1, Ordering::SeqCst);
            }
        };
        let first = bus.subscribe(make(Arc::clone(&count)));
        let _second = bus.subscribe(make(Arc::clone(&count)));

        first.unsubscribe();
        bus.emit(&event("x"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_during_emit_uses_snapshot() {
        let bus = EventBus::new();
        let victim_hits = Arc::new(AtomicUsize::new(0));
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        // First listener removes the second mid-emit.
        let slot_clone = Arc::clone(&slot);
        let _killer = bus.subscribe(move |_| {
            if let Some(sub) = slot_clone.lock().unwrap().as_ref() {
                sub.unsubscribe();
            }
        });
        let hits = Arc::clone(&victim_hits);
        let victim = bus.subscribe(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        });
        *slot.lock().unwrap() = Some(victim);

        // Victim was in the snapshot, so it still sees this event.
        assert_eq!(bus.emit(&event("first")), 2);
        assert_eq!(victim_hits.load(Ordering::SeqCst), 1);

        // But not the next one.
        assert_eq!(bus.emit(&event("second")), 1);
        assert_eq!(victim_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscribe_during_emit_sees_next_event_only() {
        let bus = EventBus::new();
        let late_hits = Arc::new(AtomicUsize::new(0));
        let added: Arc<Mutex<Vec<Subscription>>> = Arc::new(Mutex::new(Vec::new()));

        let bus_clone = bus.clone();
        let hits = Arc::clone(&late_hits);
        let added_clone = Arc::clone(&added);
        let _adder = bus.subscribe(move |_| {
            let mut added = added_clone.lock().unwrap();
            if added.is_empty() {
                let h = Arc::clone(&hits);
                added.push(bus_clone.subscribe(move |_| {
                    h.fetch_add(1, Ordering::SeqCst);
                }));
            }
        });

        bus.emit(&event("first"));
        assert_eq!(late_hits.load(Ordering::SeqCst), 0);

        bus.emit(&event("second"));
        assert_eq!(late_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_after_bus_dropped_is_noop() {
        let bus = EventBus::new();
        let (_count, sub) = counter(&bus);
        drop(bus);
        sub.unsubscribe();
        assert!(!sub.is_active());
    }
}
