//! Console chat client.
//!
//! Demonstrates:
//! - Building a Bridge around an AppStore
//! - Rendering `bot_uttered` replies from store mutations
//! - Sending stdin lines as user utterances
//! - Watching reconnects through state listeners
//!
//! Usage:
//!   cargo run --example console_chat
//!   cargo run --example console_chat -- --endpoint ws://localhost:5005/
//!   cargo run --example console_chat -- --debug

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use assistant_socket::protocol::AssistantEvent;
use assistant_socket::store::AppStore;
use assistant_socket::transport::StateTransition;
use assistant_socket::{Bridge, BridgeConfig, Event, Result};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments.
#[derive(Debug, Clone)]
struct Args {
    debug: bool,
    endpoint: Option<String>,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let endpoint = args
            .iter()
            .position(|a| a == "--endpoint")
            .and_then(|i| args.get(i + 1))
            .cloned();
        Self {
            debug: args.iter().any(|a| a == "--debug"),
            endpoint,
        }
    }
}

/// Conversation shown in the console.
#[derive(Debug, Default)]
struct Transcript {
    replies: usize,
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "assistant_socket=debug"
    } else {
        "assistant_socket=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

async fn run(args: Args) -> Result<()> {
    println!("=== Console Chat ===\n");

    let store = Arc::new(AppStore::new(Transcript::default()));
    store.register_mutation("SOCKET_bot_uttered", |transcript: &mut Transcript, payload: &Value| {
        transcript.replies += 1;
        let event = Event::new("bot_uttered", payload.clone());
        if let AssistantEvent::BotUttered { text, link } = AssistantEvent::parse(&event) {
            println!("bot> {text}");
            if let Some(link) = link {
                println!("     (audio: {link})");
            }
        }
    });

    let mut config = BridgeConfig::default();
    config.transport.endpoint = args.endpoint;

    let bridge = Bridge::new(config, store.clone())?;
    bridge
        .transport()
        .on_state_change(|transition: &StateTransition| {
            println!("[{}]", transition.to);
        });

    println!("Connecting to {}", bridge.transport().endpoint());
    println!("Type a message and press Enter. Ctrl+C quits.\n");
    bridge.start()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) if !line.trim().is_empty() => bridge.send_utterance(line.trim()),
                    Some(_) => {}
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    bridge.shutdown();
    let replies = store.with_state(|transcript| transcript.replies);
    println!("\n{replies} replies received");

    Ok(())
}
