//! Event handler registry.
//!
//! Holds named handlers, catch-all handlers and state listeners. Handlers
//! are cloned out of the registry before being called, so a handler may
//! register or remove handlers without deadlocking.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::identifiers::SubscriptionId;
use crate::protocol::Event;

use super::state::StateTransition;

// ============================================================================
// Types
// ============================================================================

/// Event handler callback type.
///
/// Called on the transport task for each matching event, in arrival order.
pub type EventHandler = Arc<dyn Fn(&Event) + Send + Sync>;

/// State listener callback type.
pub type StateListener = Arc<dyn Fn(&StateTransition) + Send + Sync>;

type Entries<H> = Vec<(SubscriptionId, H)>;

// ============================================================================
// HandlerRegistry
// ============================================================================

/// Subscriptions shared between transport handles and the event loop.
#[derive(Default)]
pub(crate) struct HandlerRegistry {
    /// Handlers keyed by event name.
    named: RwLock<FxHashMap<String, Entries<EventHandler>>>,
    /// Handlers receiving every event.
    any: RwLock<Entries<EventHandler>>,
    /// State change listeners.
    state: RwLock<Entries<StateListener>>,
}

impl HandlerRegistry {
    /// Registers a handler for one event name.
    ///
    /// Registering the same closure twice invokes it twice per event.
    pub fn on_event(&self, name: impl Into<String>, handler: EventHandler) -> SubscriptionId {
        let id = SubscriptionId::generate();
        self.named
            .write()
            .entry(name.into())
            .or_default()
            .push((id, handler));
        id
    }

    /// Registers a handler for every event.
    pub fn on_any(&self, handler: EventHandler) -> SubscriptionId {
        let id = SubscriptionId::generate();
        self.any.write().push((id, handler));
        id
    }

    /// Registers a state listener.
    pub fn on_state_change(&self, listener: StateListener) -> SubscriptionId {
        let id = SubscriptionId::generate();
        self.state.write().push((id, listener));
        id
    }

    /// Removes a subscription of any kind. Returns `true` if it existed.
    pub fn off(&self, id: SubscriptionId) -> bool {
        {
            let mut named = self.named.write();
            let removed = named
                .values_mut()
                .any(|entries| remove_entry(entries, id));
            if removed {
                named.retain(|_, entries| !entries.is_empty());
                return true;
            }
        }

        remove_entry(&mut self.any.write(), id) || remove_entry(&mut self.state.write(), id)
    }

    /// Delivers an event to named handlers, then catch-all handlers.
    ///
    /// Returns the number of handlers invoked.
    pub fn deliver(&self, event: &Event) -> usize {
        let mut handlers: Vec<EventHandler> = self
            .named
            .read()
            .get(&event.name)
            .map(|entries| entries.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();
        handlers.extend(self.any.read().iter().map(|(_, h)| Arc::clone(h)));

        for handler in &handlers {
            handler(event);
        }

        trace!(event = %event.name, handlers = handlers.len(), "Event delivered");
        handlers.len()
    }

    /// Notifies state listeners.
    pub fn notify_state(&self, transition: &StateTransition) {
        let listeners: Vec<StateListener> =
            self.state.read().iter().map(|(_, l)| Arc::clone(l)).collect();

        for listener in listeners {
            listener(transition);
        }
    }

    /// Returns the number of handlers registered for a name.
    #[must_use]
    pub fn handler_count(&self, name: &str) -> usize {
        self.named.read().get(name).map_or(0, Vec::len)
    }
}

/// Removes the entry with `id`, keeping the order of the rest.
fn remove_entry<H>(entries: &mut Entries<H>, id: SubscriptionId) -> bool {
    let before = entries.len();
    entries.retain(|(entry_id, _)| *entry_id != id);
    entries.len() != before
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;
    use serde_json::{Value, json};

    use crate::transport::state::{ConnectionState, TransitionCause};

    fn counter() -> (Arc<AtomicUsize>, EventHandler) {
        let count = Arc::new(AtomicUsize::new(0));
        let clone = Arc::clone(&count);
        let handler: EventHandler = Arc::new(move |_: &Event| {
            clone.fetch_add(1, Ordering::SeqCst);
        });
        (count, handler)
    }

    #[test]
    fn test_named_handler_receives_matching_events_only() {
        let registry = HandlerRegistry::default();
        let (count, handler) = counter();
        registry.on_event("bot_uttered", handler);

        registry.deliver(&Event::new("bot_uttered", json!({ "text": "hi" })));
        registry.deliver(&Event::new("typing", Value::Null));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_same_handler_registered_twice_fans_out_twice() {
        let registry = HandlerRegistry::default();
        let (count, handler) = counter();
        registry.on_event("bot_uttered", Arc::clone(&handler));
        registry.on_event("bot_uttered", handler);

        let invoked = registry.deliver(&Event::new("bot_uttered", Value::Null));

        assert_eq!(invoked, 2);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_any_handler_receives_everything() {
        let registry = HandlerRegistry::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let clone = Arc::clone(&seen);
        registry.on_any(Arc::new(move |event: &Event| clone.lock().push(event.name.clone())));

        registry.deliver(&Event::new("a", Value::Null));
        registry.deliver(&Event::new("b", Value::Null));

        assert_eq!(*seen.lock(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_off_removes_handler() {
        let registry = HandlerRegistry::default();
        let (count, handler) = counter();
        let id = registry.on_event("x", handler);

        assert!(registry.off(id));
        assert!(!registry.off(id));
        assert_eq!(registry.handler_count("x"), 0);

        registry.deliver(&Event::new("x", Value::Null));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_handler_may_register_during_delivery() {
        let registry = Arc::new(HandlerRegistry::default());
        let inner = Arc::clone(&registry);
        registry.on_event(
            "x",
            Arc::new(move |_: &Event| {
                inner.on_event("y", Arc::new(|_: &Event| {}));
            }),
        );

        registry.deliver(&Event::new("x", Value::Null));
        assert_eq!(registry.handler_count("y"), 1);
    }

    #[test]
    fn test_state_listeners_notified() {
        let registry = HandlerRegistry::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let clone = Arc::clone(&seen);
        let id = registry.on_state_change(Arc::new(move |t: &StateTransition| clone.lock().push(*t)));

        let transition = StateTransition {
            from: ConnectionState::Disconnected,
            to: ConnectionState::Connecting,
            cause: TransitionCause::Start,
        };
        registry.notify_state(&transition);

        assert_eq!(*seen.lock(), vec![transition]);
        assert!(registry.off(id));
    }
}
