//! Reference store implementation.
//!
//! [`AppStore`] keeps state `S` behind a mutex and dispatches to handlers
//! registered by name.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use assistant_socket::store::{Action, AppStore, Store};
//! use serde_json::json;
//!
//! #[derive(Default)]
//! struct Chat {
//!     messages: Vec<String>,
//! }
//!
//! let store = Arc::new(AppStore::new(Chat::default()));
//! store.register_mutation("SOCKET_bot_uttered", |chat: &mut Chat, payload| {
//!     if let Some(text) = payload["text"].as_str() {
//!         chat.messages.push(text.to_string());
//!     }
//! });
//!
//! store.mutate("SOCKET_bot_uttered", &json!({ "text": "hi" }));
//! assert_eq!(store.with_state(|chat| chat.messages.len()), 1);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::{debug, trace};

use crate::identifiers::SubscriptionId;

use super::Store;
use super::action::{Action, ActionSubscriber};

// ============================================================================
// Types
// ============================================================================

/// Mutation callback: a synchronous write against the state.
pub type MutationHandler<S> = Arc<dyn Fn(&mut S, &Value) + Send + Sync>;

/// Action callback.
pub type ActionHandler<S> = Arc<dyn Fn(&ActionContext<'_, S>, &Value) + Send + Sync>;

// ============================================================================
// AppStore
// ============================================================================

/// Store holding state `S` with name-keyed mutations and actions.
///
/// Handlers are cloned out of their registry before being called, so an
/// action handler may commit, dispatch or register more handlers.
pub struct AppStore<S> {
    /// Application state.
    state: Mutex<S>,
    /// Mutations by name.
    mutations: RwLock<FxHashMap<String, MutationHandler<S>>>,
    /// Actions by name.
    actions: RwLock<FxHashMap<String, ActionHandler<S>>>,
    /// Action subscribers, in registration order.
    subscribers: RwLock<Vec<(SubscriptionId, ActionSubscriber)>>,
}

impl<S> fmt::Debug for AppStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppStore")
            .field("mutations", &self.mutations.read().len())
            .field("actions", &self.actions.read().len())
            .field("subscribers", &self.subscribers.read().len())
            .finish_non_exhaustive()
    }
}

impl<S: Default> Default for AppStore<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

// ============================================================================
// AppStore - Registration
// ============================================================================

impl<S> AppStore<S> {
    /// Creates a store with initial state.
    #[must_use]
    pub fn new(state: S) -> Self {
        Self {
            state: Mutex::new(state),
            mutations: RwLock::new(FxHashMap::default()),
            actions: RwLock::new(FxHashMap::default()),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Registers a mutation, replacing any previous one with that name.
    pub fn register_mutation<F>(&self, name: impl Into<String>, mutation: F)
    where
        F: Fn(&mut S, &Value) + Send + Sync + 'static,
    {
        self.mutations.write().insert(name.into(), Arc::new(mutation));
    }

    /// Registers an action, replacing any previous one with that name.
    pub fn register_action<F>(&self, name: impl Into<String>, action: F)
    where
        F: Fn(&ActionContext<'_, S>, &Value) + Send + Sync + 'static,
    {
        self.actions.write().insert(name.into(), Arc::new(action));
    }

    /// Returns `true` if a mutation is registered under `name`.
    #[must_use]
    pub fn has_mutation(&self, name: &str) -> bool {
        self.mutations.read().contains_key(name)
    }

    /// Returns `true` if an action is registered under `name`.
    #[must_use]
    pub fn has_action(&self, name: &str) -> bool {
        self.actions.read().contains_key(name)
    }
}

// ============================================================================
// AppStore - State Access
// ============================================================================

impl<S> AppStore<S> {
    /// Reads the state.
    ///
    /// Do not call `mutate` from inside `read`: the state lock is held.
    pub fn with_state<R>(&self, read: impl FnOnce(&S) -> R) -> R {
        read(&self.state.lock())
    }

    /// Applies a mutation; returns `false` if the name is unknown.
    pub fn commit(&self, name: &str, payload: &Value) -> bool {
        let mutation = self.mutations.read().get(name).cloned();

        match mutation {
            Some(mutation) => {
                let mut state = self.state.lock();
                mutation(&mut *state, payload);
                trace!(mutation = name, "Mutation applied");
                true
            }
            None => {
                debug!(mutation = name, "No mutation registered, ignoring");
                false
            }
        }
    }
}

impl<S: Clone> AppStore<S> {
    /// Returns a copy of the state.
    #[must_use]
    pub fn snapshot(&self) -> S {
        self.state.lock().clone()
    }
}

// ============================================================================
// AppStore - Store
// ============================================================================

impl<S: Send + 'static> Store for AppStore<S> {
    fn mutate(&self, name: &str, payload: &Value) {
        self.commit(name, payload);
    }

    fn dispatch(&self, action: Action) {
        let subscribers: Vec<ActionSubscriber> = self
            .subscribers
            .read()
            .iter()
            .map(|(_, s)| Arc::clone(s))
            .collect();

        for subscriber in &subscribers {
            subscriber(&action);
        }

        let handler = self.actions.read().get(&action.name).cloned();

        match handler {
            Some(handler) => {
                let context = ActionContext {
                    store: self,
                    action: &action,
                };
                handler(&context, &action.payload);
                trace!(action = %action.name, origin = ?action.origin, "Action handled");
            }
            None => {
                debug!(action = %action.name, "No action registered, ignoring");
            }
        }
    }

    fn subscribe_actions(&self, subscriber: ActionSubscriber) -> SubscriptionId {
        let id = SubscriptionId::generate();
        self.subscribers.write().push((id, subscriber));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(entry_id, _)| *entry_id != id);
        subscribers.len() != before
    }
}

// ============================================================================
// ActionContext
// ============================================================================

/// Handle given to action handlers.
pub struct ActionContext<'a, S> {
    store: &'a AppStore<S>,
    action: &'a Action,
}

impl<S: Send + 'static> ActionContext<'_, S> {
    /// Returns the action being handled.
    #[inline]
    #[must_use]
    pub fn action(&self) -> &Action {
        self.action
    }

    /// Applies a mutation.
    pub fn commit(&self, name: &str, payload: &Value) -> bool {
        self.store.commit(name, payload)
    }

    /// Dispatches a further action.
    pub fn dispatch(&self, action: Action) {
        self.store.dispatch(action);
    }

    /// Reads the state.
    pub fn with_state<R>(&self, read: impl FnOnce(&S) -> R) -> R {
        self.store.with_state(read)
    }
}

// ============================================================================
// Tests
// ============================================================================
