// In-memory transport and recorders for driving the lifecycle controller
// deterministically under paused tokio time.

use crate::config::ManagerConfig;
use crate::error::transport::TransportError;
use crate::manager::{RealtimeManager, StateObserver};
use crate::state::ConnectionState;
use crate::transport::{Frame, FrameSink, FrameStream, Transport};

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::{BoxFuture, pending, ready};
use futures_util::{sink, stream};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{Instant, timeout};
use url::Url;

type OpenResult = Result<(FrameSink, FrameStream), TransportError>;

pub(crate) const TEST_ENDPOINT: &str = "ws://registry.test:9000/events";

/// Fast timings so paused-clock tests stay readable.
pub(crate) fn test_config() -> ManagerConfig {
    ManagerConfig {
        endpoint: TEST_ENDPOINT.to_string(),
        base_reconnect_delay_ms: 100,
        max_reconnect_delay_ms: 1_000,
        max_reconnect_attempts: 3,
        heartbeat_interval_ms: 60_000,
        heartbeat_timeout_ms: 5_000,
        connect_timeout_ms: 2_000,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpenOutcome {
    Accept,
    Refuse,
    Hang,
    /// Opens, but every outbound send blocks forever.
    Stall,
}

/// The server's side of one accepted in-memory connection.
pub(crate) struct ServerEnd {
    pub(crate) to_client: UnboundedSender<Result<Frame, TransportError>>,
    pub(crate) from_client: UnboundedReceiver<Frame>,
}

impl ServerEnd {
    pub(crate) fn send_text(&self, text: &str) {
        self.to_client
            .send(Ok(Frame::Text(text.to_string())))
            .expect("client stream dropped");
    }
}

pub(crate) struct MemoryTransport {
    script: Mutex<VecDeque<OpenOutcome>>,
    fallback: OpenOutcome,
    accepted: UnboundedSender<ServerEnd>,
    opens: AtomicUsize,
}

impl MemoryTransport {
    /// `fallback` applies once the scripted outcomes run out.
    pub(crate) fn new(fallback: OpenOutcome) -> (Arc<Self>, UnboundedReceiver<ServerEnd>) {
        let (accepted, accepted_rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            accepted,
            opens: AtomicUsize::new(0),
        });
        (transport, accepted_rx)
    }

    pub(crate) fn script(&self, outcomes: &[OpenOutcome]) {
        self.script.lock().unwrap().extend(outcomes.iter().copied());
    }

    pub(crate) fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl Transport for MemoryTransport {
    fn open(&self, _endpoint: &Url) -> BoxFuture<'static, OpenResult> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);

        match outcome {
            OpenOutcome::Refuse => {
                Box::pin(ready::<OpenResult>(Err(TransportError::connect("connection refused"))))
            }
            OpenOutcome::Hang => Box::pin(pending::<OpenResult>()),
            OpenOutcome::Accept | OpenOutcome::Stall => {
                let (client_tx, from_client) = mpsc::unbounded_channel::<Frame>();
                let (to_client, client_rx) = mpsc::unbounded_channel();
                let _ = self.accepted.send(ServerEnd {
                    to_client,
                    from_client,
                });

                let frame_sink: FrameSink = if outcome == OpenOutcome::Stall {
                    Box::pin(sink::unfold(client_tx, |_client_tx, _frame: Frame| {
                        pending::<Result<UnboundedSender<Frame>, TransportError>>()
                    }))
                } else {
                    Box::pin(sink::unfold(
                        client_tx,
                        |client_tx, frame: Frame| async move {
                            client_tx
                                .send(frame)
                                .map_err(|_| TransportError::send("server end dropped"))?;
                            Ok::<_, TransportError>(client_tx)
                        },
                    ))
                };
                let frame_stream: FrameStream = Box::pin(stream::unfold(
                    client_rx,
                    |mut client_rx: UnboundedReceiver<Result<Frame, TransportError>>| async move {
                        client_rx.recv().await.map(|item| (item, client_rx))
                    },
                ));

                Box::pin(ready::<OpenResult>(Ok((frame_sink, frame_stream))))
            }
        }
    }
}

pub(crate) fn manager_with(
    config: ManagerConfig,
    fallback: OpenOutcome,
) -> (RealtimeManager, Arc<MemoryTransport>, UnboundedReceiver<ServerEnd>) {
    let (transport, accepted) = MemoryTransport::new(fallback);
    let manager = RealtimeManager::with_transport(config, transport.clone())
        .expect("test config should build a manager");
    (manager, transport, accepted)
}

/// Observer that forwards every transition with the (paused) clock reading.
pub(crate) fn record_states(
    manager: &RealtimeManager,
) -> (StateObserver, UnboundedReceiver<(ConnectionState, Instant)>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let observer = StateObserver::new(move |state| {
        let _ = tx.send((state, Instant::now()));
    });
    manager.on_state_change(observer.clone());
    (observer, rx)
}

pub(crate) async fn next_state(
    states: &mut UnboundedReceiver<(ConnectionState, Instant)>,
) -> (ConnectionState, Instant) {
    timeout(Duration::from_secs(24 * 3600), states.recv())
        .await
        .expect("timed out waiting for a state transition")
        .expect("state channel closed")
}

/// The next `count` transitions, in the order observed.
pub(crate) async fn collect_states(
    states: &mut UnboundedReceiver<(ConnectionState, Instant)>,
    count: usize,
) -> Vec<(ConnectionState, Instant)> {
    let mut observed = Vec::with_capacity(count);
    for _ in 0..count {
        observed.push(next_state(states).await);
    }
    observed
}

pub(crate) async fn expect_states(
    states: &mut UnboundedReceiver<(ConnectionState, Instant)>,
    expected: &[ConnectionState],
) -> Vec<Instant> {
    let mut instants = Vec::with_capacity(expected.len());
    for want in expected {
        let (got, at) = next_state(states).await;
        assert_eq!(got, *want, "unexpected transition order");
        instants.push(at);
    }
    instants
}

pub(crate) async fn accept(accepted: &mut UnboundedReceiver<ServerEnd>) -> ServerEnd {
    timeout(Duration::from_secs(24 * 3600), accepted.recv())
        .await
        .expect("timed out waiting for a connection")
        .expect("transport dropped")
}
