//! In-memory connector for tests.
//!
//! Each successful connect produces a [`ServerEnd`] the test can use to
//! push frames to the client, read what the client sent, or drop to
//! simulate a remote close.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use futures_util::{sink, stream};
use tokio::sync::{Mutex, mpsc};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::Event;

use super::connector::{Connector, Duplex};

// ============================================================================
// ScriptedConnector
// ============================================================================

/// Connector that fails a fixed number of times, then succeeds forever.
#[derive(Clone)]
pub(crate) struct ScriptedConnector {
    inner: Arc<ScriptInner>,
}

struct ScriptInner {
    fail_first: u64,
    attempts: AtomicU64,
    accepted_tx: mpsc::UnboundedSender<ServerEnd>,
    accepted_rx: Mutex<mpsc::UnboundedReceiver<ServerEnd>>,
}

impl ScriptedConnector {
    /// Connector that always succeeds.
    pub fn new() -> Self {
        Self::failing(0)
    }

    /// Connector whose first `fail_first` attempts are refused.
    pub fn failing(fail_first: u64) -> Self {
        let (accepted_tx, accepted_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(ScriptInner {
                fail_first,
                attempts: AtomicU64::new(0),
                accepted_tx,
                accepted_rx: Mutex::new(accepted_rx),
            }),
        }
    }

    /// Number of connect calls so far.
    pub fn attempts(&self) -> u64 {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    /// Waits for the next successful connection.
    pub async fn accept(&self) -> ServerEnd {
        self.inner
            .accepted_rx
            .lock()
            .await
            .recv()
            .await
            .expect("connector state is owned by the test")
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, _endpoint: &Url) -> Result<Duplex> {
        let attempt = self.inner.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.inner.fail_first {
            return Err(Error::connection(format!("refused (attempt {attempt})")));
        }

        let (to_client, to_client_rx) = mpsc::unbounded_channel::<Result<String>>();
        let (from_client_tx, from_client) = mpsc::unbounded_channel::<String>();

        let sink = sink::unfold(from_client_tx, |tx, frame: String| async move {
            tx.send(frame).map_err(|_| Error::ConnectionClosed)?;
            Ok::<_, Error>(tx)
        });
        let stream = stream::unfold(to_client_rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });

        let _ = self.inner.accepted_tx.send(ServerEnd {
            to_client,
            from_client,
        });

        Ok(Duplex {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        })
    }
}

// ============================================================================
// ServerEnd
// ============================================================================

/// Remote side of one in-memory connection.
pub(crate) struct ServerEnd {
    to_client: mpsc::UnboundedSender<Result<String>>,
    from_client: mpsc::UnboundedReceiver<String>,
}

impl ServerEnd {
    /// Sends a raw text frame to the client.
    pub fn push(&self, frame: &str) {
        let _ = self.to_client.send(Ok(frame.to_string()));
    }

    /// Sends an event to the client.
    pub fn push_event(&self, event: &Event) {
        let frame = event.to_frame().expect("events serialize");
        self.push(&frame);
    }

    /// Receives the next event the client wrote, `None` once it hung up.
    pub async fn next_event(&mut self) -> Option<Event> {
        let frame = self.from_client.recv().await?;
        Event::from_frame(&frame).ok()
    }
}
