//! Channel establishment.
//!
//! A [`Connector`] opens one duplex channel to an endpoint and hands back a
//! frame sink and a frame stream. [`WsConnector`] does this over WebSocket;
//! tests substitute an in-memory connector.

// ============================================================================
// Imports
// ============================================================================

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::future::ready;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// Outbound half of a duplex channel, accepting text frames.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = Error> + Send>>;

/// Inbound half of a duplex channel, yielding text frames.
///
/// An `Err` item or the end of the stream means the channel is gone.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Both halves of an open channel.
pub struct Duplex {
    /// Frames to the remote end.
    pub sink: FrameSink,
    /// Frames from the remote end.
    pub stream: FrameStream,
}

// ============================================================================
// Connector
// ============================================================================

/// Opens duplex channels.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Performs the handshake with `endpoint`.
    ///
    /// # Errors
    ///
    /// Any error counts as a failed handshake and triggers a reconnect.
    async fn connect(&self, endpoint: &Url) -> Result<Duplex>;
}

// ============================================================================
// WsConnector
// ============================================================================

/// WebSocket connector backed by `tokio-tungstenite`.
///
/// Text frames are passed through; ping/pong/binary frames are ignored and
/// a close frame ends the channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, endpoint: &Url) -> Result<Duplex> {
        let (ws_stream, response) = connect_async(endpoint.as_str())
            .await
            .map_err(|e| Error::connection(format!("WebSocket handshake failed: {e}")))?;

        debug!(status = %response.status(), "WebSocket handshake completed");

        let (ws_write, ws_read) = ws_stream.split();

        let sink = ws_write
            .with(|text: String| ready(Ok::<_, WsError>(Message::Text(text.into()))))
            .sink_map_err(Error::from);

        let stream = ws_read.filter_map(|message| {
            ready(match message {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "WebSocket closed by remote");
                    Some(Err(Error::ConnectionClosed))
                }
                // Ignore Binary, Ping, Pong
                Ok(_) => None,
                Err(e) => Some(Err(Error::from(e))),
            })
        });

        Ok(Duplex {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        })
    }
}
