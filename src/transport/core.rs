//! Transport handle.
//!
//! [`Transport`] is the public face of the duplex channel: it starts the
//! supervisor, queues outbound events and manages handler subscriptions.
//! Clones share the same connection.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::SubscriptionId;
use crate::protocol::Event;

use super::builder::TransportBuilder;
use super::connection::{Supervisor, TransportCommand, TransportShared};
use super::connector::Connector;
use super::options::TransportOptions;
use super::state::{ConnectionState, StateTransition};

// ============================================================================
// Transport
// ============================================================================

/// Handle to one persistent duplex channel.
///
/// # Delivery
///
/// `send` is fire-and-forget with at-most-once delivery: there is no
/// acknowledgment, and an event written to a channel that then dies is not
/// retried. While not connected, events are buffered or dropped according
/// to [`OutboxPolicy`](super::OutboxPolicy).
///
/// # Lifetime
///
/// The supervisor stops on [`shutdown`](Self::shutdown) or once every
/// handle has been dropped. Handlers that capture a `Transport` clone keep
/// it alive, so call `shutdown` at teardown.
///
/// # Example
///
/// ```no_run
/// use assistant_socket::Transport;
/// use serde_json::json;
///
/// # async fn example() -> assistant_socket::Result<()> {
/// let transport = Transport::builder().origin("ws://127.0.0.1:5005").build()?;
///
/// transport.on_event("bot_uttered", |event| {
///     println!("bot: {}", event.payload["text"]);
/// });
///
/// transport.connect()?;
/// transport.send("user_uttered", json!({ "message": "hello" }));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Transport {
    /// State shared with the supervisor.
    shared: Arc<TransportShared>,
    /// Channel for sending commands to the supervisor.
    command_tx: mpsc::UnboundedSender<TransportCommand>,
    /// Receiver handed to the supervisor on `connect`.
    command_rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<TransportCommand>>>>,
    /// Set once `shutdown` was called.
    closed: Arc<AtomicBool>,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("endpoint", &self.shared.options.endpoint.as_str())
            .field("state", &self.shared.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Transport - Constructor
// ============================================================================

impl Transport {
    /// Creates a new transport builder.
    #[inline]
    #[must_use]
    pub fn builder() -> TransportBuilder {
        TransportBuilder::new()
    }

    /// Creates a transport in `Disconnected` state.
    pub(crate) fn new(options: TransportOptions, connector: Arc<dyn Connector>) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        Self {
            shared: Arc::new(TransportShared::new(options, connector)),
            command_tx,
            command_rx: Arc::new(Mutex::new(Some(command_rx))),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }
}

// ============================================================================
// Transport - Lifecycle
// ============================================================================

impl Transport {
    /// Starts connecting and returns immediately.
    ///
    /// Completion is signaled through the `connect` lifecycle event and
    /// state listeners. Connection failures never surface here: they move
    /// the transport into `Reconnecting`.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyStarted`] if `connect` was already called
    /// - [`Error::ConnectionClosed`] if the transport was shut down
    /// - [`Error::Config`] if called outside a tokio runtime
    pub fn connect(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::ConnectionClosed);
        }

        let runtime = Handle::try_current()
            .map_err(|_| Error::config("Transport::connect must be called within a tokio runtime"))?;

        let command_rx = self.command_rx.lock().take().ok_or(Error::AlreadyStarted)?;

        let supervisor = Supervisor::new(Arc::clone(&self.shared), command_rx);
        runtime.spawn(supervisor.run());

        Ok(())
    }

    /// Drops the open connection and connects again without delay.
    ///
    /// While waiting to reconnect, this skips the remaining delay.
    pub fn reconnect(&self) {
        let _ = self.command_tx.send(TransportCommand::Reconnect);
    }

    /// Closes the connection and cancels any pending reconnect.
    ///
    /// Idempotent. Events queued before the call are still processed in
    /// order; events sent afterwards are dropped.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!(endpoint = %self.shared.options.endpoint, "Transport shutdown requested");
        let _ = self.command_tx.send(TransportCommand::Shutdown);
    }

    /// Returns the current connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Returns `true` while the channel is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Returns the configured endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.shared.options.endpoint
    }

    /// Returns the validated options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &TransportOptions {
        &self.shared.options
    }
}

// ============================================================================
// Transport - Messaging
// ============================================================================

impl Transport {
    /// Queues an event for transmission. Never blocks.
    pub fn send(&self, name: impl Into<String>, payload: Value) {
        self.emit(Event::new(name, payload));
    }

    /// Queues a prepared event for transmission. Never blocks.
    pub fn emit(&self, event: Event) {
        if self.closed.load(Ordering::SeqCst) {
            debug!(event = %event.name, "Transport closed, dropping outbound event");
            return;
        }

        if let Err(mpsc::error::SendError(command)) =
            self.command_tx.send(TransportCommand::Send(event))
        {
            debug!(?command, "Event loop gone, dropping outbound event");
        }
    }
}

// ============================================================================
// Transport - Subscriptions
// ============================================================================

impl Transport {
    /// Registers a handler for events named `name`.
    ///
    /// Handlers are not deduplicated: registering twice invokes twice.
    pub fn on_event<F>(&self, name: impl Into<String>, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.shared.handlers.on_event(name, Arc::new(handler))
    }

    /// Registers a handler for every inbound and lifecycle event.
    pub fn on_any<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.shared.handlers.on_any(Arc::new(handler))
    }

    /// Registers a listener for state transitions.
    pub fn on_state_change<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&StateTransition) + Send + Sync + 'static,
    {
        self.shared.handlers.on_state_change(Arc::new(listener))
    }

    /// Removes a handler or listener. Returns `true` if it existed.
    pub fn off(&self, id: SubscriptionId) -> bool {
        self.shared.handlers.off(id)
    }
}

// ============================================================================
// Tests
// ============================================================================
