use crate::helpers::{
    StateRecorder, TestServer, WAIT, config_for, next_text, send_text, unused_endpoint,
};

use realtime_core::{ConnectionState, EventHandler, EventType, ManagerConfig, RealtimeManager};

use std::time::Duration;

use futures_util::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;

// ============================================================================
// Public API tests for RealtimeManager against a real WebSocket server
// ============================================================================

/// **VALUE**: Verifies the manager connects over a real socket and delivers a
/// server event to its subscriber.
///
/// **WHY THIS MATTERS**: Everything else is tested over an in-memory transport; this
/// proves the tungstenite adapter maps frames correctly.
///
/// **BUG THIS CATCHES**: Would catch a broken handshake, text frames that never reach
/// the dispatcher, or Utf8Bytes conversion mistakes.
#[tokio::test]
async fn given_running_server_when_manager_connects_then_receives_events() {
    // GIVEN: A server and a subscribed manager
    let mut server = TestServer::start().await;
    let manager = RealtimeManager::new(config_for(&server.url)).expect("Failed to build manager");
    let mut recorder = StateRecorder::attach(&manager);
    let (tx, mut events) = mpsc::unbounded_channel();
    manager.subscribe(
        EventType::ServiceRegistered,
        EventHandler::new(move |event| {
            let _ = tx.send(event.payload.clone());
            Ok(())
        }),
    );

    // WHEN: Connecting and the server publishes an event
    manager.connect();
    let mut socket = server.next_connection().await;
    let seen = recorder.wait_for(ConnectionState::Connected).await;
    send_text(
        &mut socket,
        r#"{"type":"service.registered","payload":{"name":"orders","version":"2.1.0"}}"#,
    )
    .await;

    // THEN: Subscriber receives the payload
    assert_eq!(seen, vec![ConnectionState::Connecting, ConnectionState::Connected]);
    let payload = timeout(WAIT, events.recv()).await.unwrap().unwrap();
    assert_eq!(payload["name"], "orders");

    manager.disconnect();
}

/// **VALUE**: Verifies the manager recovers when the server drops the socket.
///
/// **WHY THIS MATTERS**: Server restarts are routine; clients must come back on their own.
///
/// **BUG THIS CATCHES**: Would catch a TCP-level close that the session does not notice.
#[tokio::test]
async fn given_connected_manager_when_server_drops_socket_then_reconnects() {
    // GIVEN: A connected manager
    let mut server = TestServer::start().await;
    let manager = RealtimeManager::new(config_for(&server.url)).unwrap();
    let mut recorder = StateRecorder::attach(&manager);
    manager.connect();
    let first = server.next_connection().await;
    recorder.wait_for(ConnectionState::Connected).await;

    // WHEN: The server drops the connection
    drop(first);

    // THEN: reconnecting, then a new connection
    let seen = recorder.wait_for(ConnectionState::Connected).await;
    let _second = server.next_connection().await;
    assert_eq!(
        seen,
        vec![
            ConnectionState::Reconnecting,
            ConnectionState::Connecting,
            ConnectionState::Connected,
        ]
    );
    assert_eq!(manager.reconnect_attempts(), 0);

    manager.disconnect();
}

#[tokio::test]
async fn given_connected_manager_when_disconnect_called_then_server_sees_close() {
    // GIVEN: A connected manager
    let mut server = TestServer::start().await;
    let manager = RealtimeManager::new(config_for(&server.url)).unwrap();
    let mut recorder = StateRecorder::attach(&manager);
    manager.connect();
    let mut socket = server.next_connection().await;
    recorder.wait_for(ConnectionState::Connected).await;

    // WHEN: Disconnecting
    manager.disconnect();

    // THEN: The server observes a close frame or the end of the stream
    let closed = timeout(WAIT, async {
        loop {
            match socket.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "Server never saw the connection close");
    assert_eq!(manager.get_state(), ConnectionState::Disconnected);

    // AND: The client does not come back
    sleep(Duration::from_millis(300)).await;
    assert_eq!(manager.get_state(), ConnectionState::Disconnected);
}

/// **VALUE**: Verifies the text heartbeat against a server that answers pings.
///
/// **WHY THIS MATTERS**: The ping/pong message shapes are a contract with the server.
///
/// **BUG THIS CATCHES**: Would catch a ping missing its `type` field, or a pong that
/// the client fails to match and times out on.
#[tokio::test]
async fn given_server_answering_pings_when_heartbeat_runs_then_connection_stays_up() {
    // GIVEN: A short heartbeat
    let mut server = TestServer::start().await;
    let config = ManagerConfig {
        heartbeat_interval_ms: 100,
        heartbeat_timeout_ms: 1_000,
        ..config_for(&server.url)
    };
    let manager = RealtimeManager::new(config).unwrap();
    let mut recorder = StateRecorder::attach(&manager);
    manager.connect();
    let mut socket = server.next_connection().await;
    recorder.wait_for(ConnectionState::Connected).await;

    // WHEN: The server answers three pings
    for _ in 0..3 {
        let text = next_text(&mut socket).await.expect("Expected a ping");
        let ping: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(ping["type"], "ping");
        assert!(ping["timestamp"].is_u64());
        send_text(&mut socket, r#"{"type":"pong"}"#).await;
    }

    // THEN: Still connected
    assert_eq!(manager.get_state(), ConnectionState::Connected);

    manager.disconnect();
}

#[tokio::test]
async fn given_server_ignoring_pings_when_timeout_elapses_then_reconnects() {
    // GIVEN: A short heartbeat and a server that never answers
    let mut server = TestServer::start().await;
    let config = ManagerConfig {
        heartbeat_interval_ms: 100,
        heartbeat_timeout_ms: 200,
        ..config_for(&server.url)
    };
    let manager = RealtimeManager::new(config).unwrap();
    let mut recorder = StateRecorder::attach(&manager);
    manager.connect();
    let _silent = server.next_connection().await;
    recorder.wait_for(ConnectionState::Connected).await;

    // WHEN/THEN: The heartbeat gives up and the manager reconnects
    recorder.wait_for(ConnectionState::Reconnecting).await;
    let _second = server.next_connection().await;
    recorder.wait_for(ConnectionState::Connected).await;

    manager.disconnect();
}

/// **VALUE**: Verifies a dead endpoint ends in `failed` after the retry budget.
///
/// **WHY THIS MATTERS**: Connection refused is the most common failure and must run
/// the same backoff path as a dropped connection.
///
/// **BUG THIS CATCHES**: Would catch a refused TCP connect surfacing as a panic or
/// leaving the manager stuck in `connecting`.
#[tokio::test]
async fn given_nothing_listening_when_connecting_then_ends_failed() {
    // GIVEN: An endpoint with no server
    let endpoint = unused_endpoint().await;
    let manager = RealtimeManager::new(config_for(&endpoint)).unwrap();
    let mut recorder = StateRecorder::attach(&manager);

    // WHEN: Connecting
    manager.connect();

    // THEN: Three retries, then failed out of a final reconnecting
    let seen = recorder.wait_for(ConnectionState::Failed).await;
    let backoffs = seen
        .iter()
        .filter(|state| **state == ConnectionState::Reconnecting)
        .count();
    assert_eq!(backoffs, 4, "one per failed open: three retried, the last gives up");
    assert_eq!(seen[seen.len() - 2], ConnectionState::Reconnecting);
    assert_eq!(manager.reconnect_attempts(), 3);
}
