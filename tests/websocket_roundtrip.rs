//! End-to-end tests against a real WebSocket server on loopback.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use assistant_socket::store::{AppStore, SharedStore};
use assistant_socket::{Bridge, BridgeConfig, ConnectionState, Event, SessionId};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Notify, mpsc};
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

// ============================================================================
// Server Harness
// ============================================================================

type ServerSocket = WebSocketStream<TcpStream>;

const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Binds a loopback listener and hands every accepted socket to the test.
async fn listen() -> (String, mpsc::UnboundedReceiver<ServerSocket>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            if let Ok(ws) = tokio_tungstenite::accept_async(stream).await
                && tx.send(ws).is_err()
            {
                return;
            }
        }
    });

    (format!("ws://{addr}/"), rx)
}

async fn accept(rx: &mut mpsc::UnboundedReceiver<ServerSocket>) -> ServerSocket {
    timeout(STEP_TIMEOUT, rx.recv())
        .await
        .expect("client connected in time")
        .expect("listener alive")
}

async fn next_event(ws: &mut ServerSocket) -> Event {
    loop {
        let message = timeout(STEP_TIMEOUT, ws.next())
            .await
            .expect("frame in time")
            .expect("socket open")
            .expect("valid frame");
        if let Message::Text(text) = message {
            return Event::from_frame(text.as_str()).expect("client frames are events");
        }
    }
}

async fn push(ws: &mut ServerSocket, name: &str, payload: Value) {
    let frame = Event::new(name, payload).to_frame().expect("serialize");
    ws.send(Message::text(frame)).await.expect("send");
}

// ============================================================================
// Client Harness
// ============================================================================

/// Store collecting bot replies, with a notification per reply.
fn reply_store() -> (Arc<AppStore<Vec<String>>>, Arc<Notify>) {
    let store = Arc::new(AppStore::new(Vec::new()));
    let arrived = Arc::new(Notify::new());
    let notify = Arc::clone(&arrived);
    store.register_mutation("SOCKET_bot_uttered", move |replies: &mut Vec<String>, payload: &Value| {
        replies.push(payload["text"].as_str().unwrap_or_default().to_string());
        notify.notify_one();
    });
    (store, arrived)
}

fn bridge(endpoint: String, store: SharedStore) -> Bridge {
    let mut config = BridgeConfig::default();
    config.transport.endpoint = Some(endpoint);
    config.transport.reconnect_delay_ms = 50;
    Bridge::new(config, store).expect("bridge")
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_conversation_round_trip() {
    let (endpoint, mut accepted) = listen().await;
    let (store, arrived) = reply_store();
    let bridge = bridge(endpoint, store.clone());

    bridge.start().expect("start");
    let mut server = accept(&mut accepted).await;

    let request = next_event(&mut server).await;
    assert_eq!(request, Event::new("session_request", json!({ "session_id": null })));

    push(&mut server, "session_confirm", json!({ "session_id": "conv-1" })).await;
    push(&mut server, "bot_uttered", json!({ "text": "Hi! How can I help?" })).await;
    timeout(STEP_TIMEOUT, arrived.notified()).await.expect("reply routed");

    assert_eq!(store.snapshot(), ["Hi! How can I help?"]);
    assert_eq!(bridge.session_id(), Some(SessionId::from("conv-1")));

    bridge.send_utterance("book a table");
    let utterance = next_event(&mut server).await;
    assert_eq!(
        utterance,
        Event::new("user_uttered", json!({ "message": "book a table", "session_id": "conv-1" }))
    );

    bridge.shutdown();
}

#[tokio::test]
async fn test_reconnects_after_server_close() {
    let (endpoint, mut accepted) = listen().await;
    let (store, arrived) = reply_store();
    let bridge = bridge(endpoint, store.clone());

    bridge.start().expect("start");
    let mut first = accept(&mut accepted).await;
    next_event(&mut first).await;
    push(&mut first, "session_confirm", json!("conv-2")).await;
    push(&mut first, "bot_uttered", json!({ "text": "first" })).await;
    timeout(STEP_TIMEOUT, arrived.notified()).await.expect("reply routed");

    first.close(None).await.expect("close");
    drop(first);

    let mut second = accept(&mut accepted).await;
    let request = next_event(&mut second).await;
    assert_eq!(request.payload, json!({ "session_id": "conv-2" }));

    push(&mut second, "bot_uttered", json!({ "text": "second" })).await;
    timeout(STEP_TIMEOUT, arrived.notified()).await.expect("reply routed");

    assert_eq!(store.snapshot(), ["first", "second"]);
    assert_eq!(bridge.transport().state(), ConnectionState::Connected);
    bridge.shutdown();
}

#[tokio::test]
async fn test_messages_sent_before_connect_are_flushed() {
    let (endpoint, mut accepted) = listen().await;
    let (store, _arrived) = reply_store();

    let mut config = BridgeConfig::default();
    config.transport.endpoint = Some(endpoint);
    config.session.enabled = false;
    let bridge = Bridge::new(config, store).expect("bridge");

    bridge.send_utterance("early");
    bridge.start().expect("start");
    let mut server = accept(&mut accepted).await;

    let event = next_event(&mut server).await;
    assert_eq!(event, Event::new("user_uttered", json!({ "message": "early" })));
    bridge.shutdown();
}
