//! Connection supervisor and event loop.
//!
//! One supervisor task per transport owns the duplex channel for its whole
//! life. It handles:
//!
//! - Connect attempts with a handshake timeout
//! - Incoming frames, delivered to handlers in arrival order
//! - Outgoing events from the Rust API (written, buffered or dropped)
//! - The fixed-delay reconnect loop
//! - Shutdown, which cancels a pending reconnect timer
//!
//! Handlers run inline on this task. A slow handler therefore delays every
//! event queued behind it; there is no separate dispatch queue.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::Event;
use crate::protocol::event::{
    CONNECT, CONNECT_ERROR, DISCONNECT, RECONNECT, RECONNECT_ATTEMPT, RECONNECT_FAILED,
};

use super::connector::{Connector, Duplex, FrameSink};
use super::handlers::HandlerRegistry;
use super::options::TransportOptions;
use super::outbox::Outbox;
use super::state::{ConnectionState, StateTransition, TransitionCause};

// ============================================================================
// TransportCommand
// ============================================================================

/// Internal commands for the event loop.
#[derive(Debug)]
pub(crate) enum TransportCommand {
    /// Write an event, or queue it while not connected.
    Send(Event),
    /// Drop the open connection and connect again without delay.
    Reconnect,
    /// Close the connection and stop.
    Shutdown,
}

// ============================================================================
// TransportShared
// ============================================================================

/// State shared between transport handles and the supervisor.
pub(crate) struct TransportShared {
    /// Validated options.
    pub options: TransportOptions,
    /// Channel factory.
    pub connector: Arc<dyn Connector>,
    /// Event handlers and state listeners.
    pub handlers: HandlerRegistry,
    /// Current connection state.
    state: Mutex<ConnectionState>,
}

impl TransportShared {
    /// Creates shared state in `Disconnected`.
    pub fn new(options: TransportOptions, connector: Arc<dyn Connector>) -> Self {
        Self {
            options,
            connector,
            handlers: HandlerRegistry::default(),
            state: Mutex::new(ConnectionState::Disconnected),
        }
    }

    /// Returns the current state.
    #[inline]
    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Applies a transition if it is legal and notifies listeners.
    ///
    /// Returns `false` and leaves the state untouched otherwise.
    pub fn transition(&self, to: ConnectionState, cause: TransitionCause) -> bool {
        let transition = {
            let mut state = self.state.lock();
            let from = *state;
            if !from.can_transition(to, cause) {
                error!(%from, %to, ?cause, "Refused illegal state transition");
                return false;
            }
            *state = to;
            StateTransition { from, to, cause }
        };

        debug!(from = %transition.from, to = %transition.to, ?cause, "Connection state changed");
        self.handlers.notify_state(&transition);
        true
    }

    /// Delivers a locally synthesized lifecycle event.
    fn emit(&self, name: &str, payload: Value) {
        self.handlers.deliver(&Event::new(name, payload));
    }
}

// ============================================================================
// Phase Outcomes
// ============================================================================

/// Result of a connect attempt.
enum ConnectOutcome {
    Connected(Duplex),
    Failed(Error),
    Shutdown,
}

/// Why an open connection ended.
enum SessionEnd {
    Lost(String),
    Explicit,
    Shutdown,
}

/// Why the reconnect delay ended.
enum WaitOutcome {
    Elapsed,
    Shutdown,
}

// ============================================================================
// Supervisor
// ============================================================================

/// Owns the connection lifecycle. Spawned once per transport.
pub(crate) struct Supervisor {
    shared: Arc<TransportShared>,
    command_rx: mpsc::UnboundedReceiver<TransportCommand>,
    outbox: Outbox,
}

impl Supervisor {
    /// Creates a supervisor for the shared state and command queue.
    pub fn new(
        shared: Arc<TransportShared>,
        command_rx: mpsc::UnboundedReceiver<TransportCommand>,
    ) -> Self {
        let outbox = Outbox::new(shared.options.outbox);
        Self {
            shared,
            command_rx,
            outbox,
        }
    }

    /// Runs until shutdown, dropped handles, or an exhausted attempt budget.
    pub async fn run(mut self) {
        let endpoint = self.shared.options.endpoint.clone();

        if !self
            .shared
            .transition(ConnectionState::Connecting, TransitionCause::Start)
        {
            return;
        }

        info!(%endpoint, "Transport started");

        // Consecutive reconnect attempts since the last successful connect.
        let mut attempts: u64 = 0;

        loop {
            match self.connect_phase().await {
                ConnectOutcome::Shutdown => break,

                ConnectOutcome::Failed(e) => {
                    warn!(%endpoint, attempts, error = %e, "Connect attempt failed");
                    self.shared.emit(CONNECT_ERROR, json!(e.to_string()));
                }

                ConnectOutcome::Connected(duplex) => {
                    self.shared
                        .transition(ConnectionState::Connected, TransitionCause::Established);
                    info!(%endpoint, "Connection established");

                    self.shared.emit(CONNECT, Value::Null);
                    if attempts > 0 {
                        self.shared.emit(RECONNECT, json!(attempts));
                    }
                    attempts = 0;

                    match self.session_phase(duplex).await {
                        SessionEnd::Shutdown => break,

                        SessionEnd::Explicit => {
                            self.shared.emit(DISCONNECT, json!("reconnect requested"));
                            self.shared
                                .transition(ConnectionState::Connecting, TransitionCause::Explicit);
                            continue;
                        }

                        SessionEnd::Lost(reason) => {
                            warn!(%endpoint, %reason, "Connection lost");
                            self.shared.emit(DISCONNECT, json!(reason));
                        }
                    }
                }
            }

            if !self.shared.options.may_retry(attempts) {
                warn!(%endpoint, attempts, "Reconnection exhausted");
                self.shared
                    .transition(ConnectionState::Disconnected, TransitionCause::Exhausted);
                self.shared.emit(RECONNECT_FAILED, json!(attempts));
                break;
            }

            self.shared
                .transition(ConnectionState::Reconnecting, TransitionCause::Failure);

            if let WaitOutcome::Shutdown = self.wait_phase().await {
                break;
            }

            attempts = attempts.saturating_add(1);
            self.shared.emit(RECONNECT_ATTEMPT, json!(attempts));
            self.shared
                .transition(ConnectionState::Connecting, TransitionCause::Retry);
        }

        if self.shared.state() != ConnectionState::Disconnected {
            self.shared
                .transition(ConnectionState::Disconnected, TransitionCause::Shutdown);
        }

        let dropped = self.outbox.len();
        if dropped > 0 {
            debug!(dropped, "Discarding buffered events on shutdown");
        }

        debug!(%endpoint, "Event loop terminated");
    }

    /// Runs one connect attempt while still serving commands.
    async fn connect_phase(&mut self) -> ConnectOutcome {
        let endpoint = self.shared.options.endpoint.clone();
        let connector = Arc::clone(&self.shared.connector);
        let connect_timeout = self.shared.options.connect_timeout;

        let connect = async move {
            match timeout(connect_timeout, connector.connect(&endpoint)).await {
                Ok(result) => result,
                Err(_) => Err(Error::connection_timeout(
                    connect_timeout.as_millis() as u64,
                )),
            }
        };
        tokio::pin!(connect);

        loop {
            tokio::select! {
                result = &mut connect => {
                    return match result {
                        Ok(duplex) => ConnectOutcome::Connected(duplex),
                        Err(e) => ConnectOutcome::Failed(e),
                    };
                }

                command = self.command_rx.recv() => {
                    match command {
                        Some(TransportCommand::Send(event)) => self.outbox.push(event),
                        Some(TransportCommand::Reconnect) => {
                            debug!("Reconnect requested while connecting, ignoring");
                        }
                        Some(TransportCommand::Shutdown) | None => {
                            debug!("Shutdown during connect attempt");
                            return ConnectOutcome::Shutdown;
                        }
                    }
                }
            }
        }
    }

    /// Serves an open connection until it ends.
    async fn session_phase(&mut self, duplex: Duplex) -> SessionEnd {
        let Duplex {
            mut sink,
            mut stream,
        } = duplex;

        let pending = self.outbox.drain();
        if !pending.is_empty() {
            debug!(count = pending.len(), "Flushing buffered events");
        }
        for event in &pending {
            if let Err(e) = write_event(&mut sink, event).await {
                return SessionEnd::Lost(e.to_string());
            }
        }

        loop {
            tokio::select! {
                // Incoming frames from the remote end
                frame = stream.next() => {
                    match frame {
                        Some(Ok(text)) => self.handle_frame(&text),

                        Some(Err(Error::ConnectionClosed)) => {
                            return SessionEnd::Lost("io server disconnect".into());
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "Channel error");
                            return SessionEnd::Lost(e.to_string());
                        }

                        None => {
                            debug!("Channel stream ended");
                            return SessionEnd::Lost("transport close".into());
                        }
                    }
                }

                // Commands from the Rust API
                command = self.command_rx.recv() => {
                    match command {
                        Some(TransportCommand::Send(event)) => {
                            if let Err(e) = write_event(&mut sink, &event).await {
                                return SessionEnd::Lost(e.to_string());
                            }
                        }

                        Some(TransportCommand::Reconnect) => {
                            debug!("Reconnect command received");
                            let _ = sink.close().await;
                            return SessionEnd::Explicit;
                        }

                        Some(TransportCommand::Shutdown) | None => {
                            debug!("Shutdown command received");
                            let _ = sink.close().await;
                            return SessionEnd::Shutdown;
                        }
                    }
                }
            }
        }
    }

    /// Waits out the reconnect delay while still serving commands.
    ///
    /// An explicit reconnect request cuts the delay short.
    async fn wait_phase(&mut self) -> WaitOutcome {
        let delay = sleep(self.shared.options.reconnect_delay);
        tokio::pin!(delay);

        loop {
            tokio::select! {
                () = &mut delay => return WaitOutcome::Elapsed,

                command = self.command_rx.recv() => {
                    match command {
                        Some(TransportCommand::Send(event)) => self.outbox.push(event),
                        Some(TransportCommand::Reconnect) => {
                            debug!("Reconnect requested, skipping delay");
                            return WaitOutcome::Elapsed;
                        }
                        Some(TransportCommand::Shutdown) | None => {
                            debug!("Shutdown cancels pending reconnect");
                            return WaitOutcome::Shutdown;
                        }
                    }
                }
            }
        }
    }

    /// Parses an incoming frame and delivers it.
    fn handle_frame(&self, text: &str) {
        match Event::from_frame(text) {
            Ok(event) => {
                trace!(event = %event.name, "Frame received");
                self.shared.handlers.deliver(&event);
            }
            Err(e) => warn!(error = %e, frame = %text, "Dropping unroutable frame"),
        }
    }
}

/// Writes one event to the sink.
///
/// Serialization failures drop the event; only sink failures are returned.
async fn write_event(sink: &mut FrameSink, event: &Event) -> Result<()> {
    let frame = match event.to_frame() {
        Ok(frame) => frame,
        Err(e) => {
            warn!(event = %event.name, error = %e, "Failed to serialize outbound event");
            return Ok(());
        }
    };

    sink.send(frame).await?;
    trace!(event = %event.name, "Event sent");
    Ok(())
}
