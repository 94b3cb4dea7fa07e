//! Test helpers for realtime-core integration tests.
//!
//! Runs a real WebSocket server on an ephemeral localhost port and records
//! connection-state transitions from the public observer API.

use realtime_core::{ConnectionState, ManagerConfig, RealtimeManager, StateObserver};

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::timeout;
use tokio_tungstenite::{WebSocketStream, accept_async, tungstenite::Message};

pub type ServerSocket = WebSocketStream<TcpStream>;

/// Upper bound for anything a test waits on.
pub const WAIT: Duration = Duration::from_secs(5);

pub struct TestServer {
    pub url: String,
    connections: UnboundedReceiver<ServerSocket>,
}

impl TestServer {
    /// Bind to `127.0.0.1:0` and accept WebSocket upgrades in the background.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let address = listener.local_addr().expect("Listener has no address");
        let (tx, connections) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let Ok(socket) = accept_async(stream).await else {
                    continue;
                };
                if tx.send(socket).is_err() {
                    break;
                }
            }
        });

        Self {
            url: format!("ws://{address}/events"),
            connections,
        }
    }

    pub async fn next_connection(&mut self) -> ServerSocket {
        timeout(WAIT, self.connections.recv())
            .await
            .expect("Timed out waiting for a client connection")
            .expect("Accept loop stopped")
    }
}

/// A ws:// URL on a port nothing listens on.
pub async fn unused_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind probe listener");
    let address = listener.local_addr().expect("Listener has no address");
    drop(listener);
    format!("ws://{address}/events")
}

/// Fast retries, heartbeat effectively off unless a test shortens it.
pub fn config_for(endpoint: &str) -> ManagerConfig {
    ManagerConfig {
        endpoint: endpoint.to_string(),
        base_reconnect_delay_ms: 50,
        max_reconnect_delay_ms: 200,
        max_reconnect_attempts: 3,
        heartbeat_interval_ms: 60_000,
        heartbeat_timeout_ms: 2_000,
        connect_timeout_ms: 2_000,
    }
}

pub struct StateRecorder {
    _observer: StateObserver,
    states: UnboundedReceiver<ConnectionState>,
}

impl StateRecorder {
    pub fn attach(manager: &RealtimeManager) -> Self {
        let (tx, states) = mpsc::unbounded_channel();
        let observer = StateObserver::new(move |state| {
            let _ = tx.send(state);
        });
        manager.on_state_change(observer.clone());
        Self {
            _observer: observer,
            states,
        }
    }

    /// Skip transitions until `wanted` is seen. Returns everything seen on the way.
    pub async fn wait_for(&mut self, wanted: ConnectionState) -> Vec<ConnectionState> {
        let mut seen = Vec::new();
        loop {
            let state = timeout(WAIT, self.states.recv())
                .await
                .unwrap_or_else(|_| panic!("Timed out waiting for {wanted}, saw {seen:?}"))
                .expect("State channel closed");
            seen.push(state);
            if state == wanted {
                return seen;
            }
        }
    }
}

pub async fn send_text(socket: &mut ServerSocket, text: &str) {
    socket
        .send(Message::Text(text.into()))
        .await
        .expect("Failed to send frame");
}

/// Next text frame from the client, skipping control frames.
pub async fn next_text(socket: &mut ServerSocket) -> Option<String> {
    loop {
        let message = timeout(WAIT, socket.next())
            .await
            .expect("Timed out waiting for a client frame")?;
        match message {
            Ok(Message::Text(text)) => return Some(text.as_str().to_string()),
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
}
