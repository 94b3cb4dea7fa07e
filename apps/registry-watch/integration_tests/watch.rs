use registry_watch::notifications::{
    CONNECTED_MESSAGE, DISCONNECTED_MESSAGE, Notification, RECONNECTING_MESSAGE,
};
use registry_watch::state::AppState;

use realtime_core::{ConnectionState, ManagerConfig};

use std::time::Duration;

use futures_util::SinkExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, tungstenite::Message};

// ============================================================================
// Integration tests for AppState + realtime-core against a real server
// ============================================================================

const WAIT: Duration = Duration::from_secs(5);

async fn next(notifications: &mut mpsc::UnboundedReceiver<Notification>) -> &'static str {
    timeout(WAIT, notifications.recv())
        .await
        .expect("Timed out waiting for a notification")
        .expect("Notification channel closed")
        .message
}

/// **VALUE**: Verifies the composition root end to end: connect, notify, recover,
/// disconnect.
///
/// **WHY THIS MATTERS**: This is the sequence a user sees during a server restart.
///
/// **BUG THIS CATCHES**: Would catch the notifier not being registered by `start()`,
/// or reconnect notifications arriving out of order.
#[tokio::test]
async fn given_running_server_when_app_started_then_notifications_follow_connection() {
    // GIVEN: A local WebSocket server that hands accepted sockets to the test
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let (socket_tx, mut sockets) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            if let Ok(socket) = accept_async(stream).await {
                let _ = socket_tx.send(socket);
            }
        }
    });

    // GIVEN: App state whose notifications are captured
    let (notify_tx, mut notifications) = mpsc::unbounded_channel::<Notification>();
    let config = ManagerConfig {
        endpoint: format!("ws://{address}/events"),
        base_reconnect_delay_ms: 50,
        max_reconnect_delay_ms: 200,
        ..ManagerConfig::default()
    };
    let state = AppState::with_notification_sink(config, move |notification| {
        let _ = notify_tx.send(notification);
    });

    // WHEN: Starting
    let manager = state.start().unwrap();
    let mut first = timeout(WAIT, sockets.recv()).await.unwrap().unwrap();

    // THEN: Connected notification
    assert_eq!(next(&mut notifications).await, CONNECTED_MESSAGE);

    // AND: Events flow while connected
    first
        .send(Message::Text(
            r#"{"type":"service.registered","payload":{"name":"orders"}}"#.into(),
        ))
        .await
        .unwrap();

    // WHEN: The server drops the socket
    drop(first);

    // THEN: Warning, then connected again
    assert_eq!(next(&mut notifications).await, RECONNECTING_MESSAGE);
    let _second = timeout(WAIT, sockets.recv()).await.unwrap().unwrap();
    assert_eq!(next(&mut notifications).await, CONNECTED_MESSAGE);

    // WHEN: Stopping
    state.stop();

    // THEN: Disconnected notification and state
    assert_eq!(next(&mut notifications).await, DISCONNECTED_MESSAGE);
    assert_eq!(manager.get_state(), ConnectionState::Disconnected);
}
