//! Application state store.
//!
//! The store is the single source of application truth. This module defines
//! the contract the router relies on ([`Store`]) and a ready-made
//! implementation ([`AppStore`]).
//!
//! | Entry point | Semantics |
//! |-------------|-----------|
//! | `mutate` | Synchronous state write, never fails, unknown names are no-ops |
//! | `dispatch` | Named operation that may commit mutations or start side effects |
//! | `subscribe_actions` | Observe every dispatched action |
//!
//! The store is constructed explicitly and passed around as
//! [`SharedStore`], so tests can substitute their own implementation.

// ============================================================================
// Submodules
// ============================================================================

/// Store actions.
pub mod action;

/// Reference store implementation.
pub mod app;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;

use crate::identifiers::SubscriptionId;

// ============================================================================
// Re-exports
// ============================================================================

pub use action::{Action, ActionOrigin, ActionSubscriber};
pub use app::{ActionContext, ActionHandler, AppStore, MutationHandler};

// ============================================================================
// Store
// ============================================================================

/// External contract of the application store.
///
/// Errors inside action handlers are the store's concern; none of these
/// methods report failure to the caller.
pub trait Store: Send + Sync + 'static {
    /// Applies the mutation registered under `name`.
    ///
    /// Unknown names are a no-op.
    fn mutate(&self, name: &str, payload: &Value);

    /// Dispatches an action.
    ///
    /// Subscribers are notified even when no handler is registered.
    fn dispatch(&self, action: Action);

    /// Registers an action subscriber.
    fn subscribe_actions(&self, subscriber: ActionSubscriber) -> SubscriptionId;

    /// Removes an action subscriber. Returns `true` if it existed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// Store shared between the router and presentation code.
pub type SharedStore = Arc<dyn Store>;
