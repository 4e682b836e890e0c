//! Event router.
//!
//! [`EventRouter`] bridges the transport and the store without either of
//! them knowing about the other.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::identifiers::SubscriptionId;
use crate::protocol::Event;
use crate::store::{Action, SharedStore, Store};
use crate::transport::Transport;

use super::options::RouterOptions;

// ============================================================================
// EventRouter
// ============================================================================

/// Routes inbound events into the store and reserved actions out to the
/// transport.
///
/// # Inbound
///
/// Every event the transport delivers, lifecycle events included, becomes
/// one `mutate` followed by one `dispatch` of a
/// [`Remote`](crate::store::ActionOrigin::Remote) action. Both run on the
/// transport's event loop before the next event is delivered, so a slow
/// store handler delays every later event.
///
/// # Outbound
///
/// Every [`Local`](crate::store::ActionOrigin::Local) action whose name
/// starts with the reserved prefix is sent with the prefix stripped.
/// Remote actions are never sent, so an inbound event cannot echo back.
///
/// # Lifetime
///
/// While attached, the transport holds the store and the store holds the
/// transport. Call [`detach`](Self::detach) at teardown.
pub struct EventRouter {
    /// Naming convention.
    options: Arc<RouterOptions>,
    /// Target store.
    store: SharedStore,
    /// Source and sink of wire events.
    transport: Transport,
    /// Active subscriptions, `None` while detached.
    attachment: Mutex<Option<Attachment>>,
}

/// Subscriptions created by `attach`.
#[derive(Debug, Clone, Copy)]
struct Attachment {
    inbound: SubscriptionId,
    outbound: SubscriptionId,
}

impl fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRouter")
            .field("options", &self.options)
            .field("attached", &self.is_attached())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// EventRouter - Constructor
// ============================================================================

impl EventRouter {
    /// Creates a detached router.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if a prefix is empty
    /// or contains whitespace.
    pub fn new(options: RouterOptions, store: SharedStore, transport: Transport) -> Result<Self> {
        options.validate()?;

        Ok(Self {
            options: Arc::new(options),
            store,
            transport,
            attachment: Mutex::new(None),
        })
    }

    /// Returns the naming convention.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    /// Returns `true` while subscribed to the transport and store.
    #[inline]
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attachment.lock().is_some()
    }
}

// ============================================================================
// EventRouter - Attachment
// ============================================================================

impl EventRouter {
    /// Subscribes to inbound events and dispatched actions.
    ///
    /// Attaching an attached router does nothing.
    pub fn attach(&self) {
        let mut attachment = self.attachment.lock();
        if attachment.is_some() {
            warn!("Router already attached, ignoring");
            return;
        }

        let inbound = {
            let options = Arc::clone(&self.options);
            let store = Arc::clone(&self.store);
            self.transport
                .on_any(move |event| route_inbound(&options, store.as_ref(), event))
        };

        let outbound = {
            let options = Arc::clone(&self.options);
            let transport = self.transport.clone();
            self.store.subscribe_actions(Arc::new(move |action: &Action| {
                route_outbound(&options, &transport, action);
            }))
        };

        *attachment = Some(Attachment { inbound, outbound });
        debug!(
            mutation_prefix = %self.options.mutation_prefix,
            action_prefix = %self.options.action_prefix,
            reserved_prefix = %self.options.reserved_prefix,
            "Router attached"
        );
    }

    /// Removes both subscriptions. Detaching a detached router does nothing.
    pub fn detach(&self) {
        let Some(attachment) = self.attachment.lock().take() else {
            return;
        };

        self.transport.off(attachment.inbound);
        self.store.unsubscribe(attachment.outbound);
        debug!("Router detached");
    }
}

// ============================================================================
// Routing
// ============================================================================

/// Mirrors one inbound event into the store: mutation first, then action.
fn route_inbound(options: &RouterOptions, store: &dyn Store, event: &Event) {
    let mutation = options.mutation_name(&event.name);
    let action = options.action_name(&event.name);
    trace!(event = %event.name, %mutation, %action, "Routing inbound event");

    store.mutate(&mutation, &event.payload);
    store.dispatch(Action::remote(action, event.payload.clone()));
}

/// Sends a local reserved action through the transport.
fn route_outbound(options: &RouterOptions, transport: &Transport, action: &Action) {
    if !action.is_local() {
        return;
    }

    let Some(event) = options.outbound_event_name(&action.name) else {
        return;
    };

    trace!(action = %action.name, %event, "Forwarding outbound action");
    transport.send(event, action.payload.clone());
}

// ============================================================================
// Tests
// ============================================================================
