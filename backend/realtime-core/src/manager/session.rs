//! The session task: one per explicit `connect()`.
//!
//! Owns the transport halves, the backoff policy and the heartbeat. Loops
//! through open -> serve -> back off until it is told to stop, its epoch is
//! superseded, or the retry budget runs out.

use crate::error::transport::TransportError;
use crate::events::InboundEvent;
use crate::heartbeat::{Heartbeat, expired, is_pong, ping_frame};
use crate::manager::Shared;
use crate::retry::ReconnectBackoff;
use crate::state::ConnectionState;
use crate::transport::{Frame, FrameSink, FrameStream};

use std::sync::Arc;

use backoff::backoff::Backoff;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, trace, warn};
use tokio::sync::oneshot;
use tokio::time::{sleep, timeout};
use uuid::Uuid;

/// Why a live connection stopped being served.
enum ConnectionEnd {
    /// `disconnect()` or a newer `connect()` took over.
    Shutdown,
    /// Anything the controller should recover from.
    Lost(String),
}

pub(crate) async fn run(shared: Arc<Shared>, epoch: u64, mut shutdown: oneshot::Receiver<()>) {
    let session_id = Uuid::new_v4();
    let mut backoff = ReconnectBackoff::from_config(&shared.config);

    debug!("Session {session_id} started (epoch {epoch})");

    loop {
        let opened = tokio::select! {
            biased;
            _ = &mut shutdown => {
                debug!("Session {session_id} stopped while connecting");
                return;
            }
            result = timeout(
                shared.config.connect_timeout(),
                shared.transport.open(&shared.endpoint),
            ) => result.unwrap_or_else(|_| Err(TransportError::timeout(shared.config.connect_timeout()))),
        };

        match opened {
            Ok((sink, stream)) => {
                backoff.reset();
                if !shared
                    .lifecycle
                    .advance_counting(epoch, ConnectionState::Connected, 0)
                {
                    close_quietly(sink).await;
                    return;
                }
                info!("Session {session_id} connected to {}", shared.endpoint);

                match serve(&shared, sink, stream, &mut shutdown).await {
                    ConnectionEnd::Shutdown => {
                        debug!("Session {session_id} closed on request");
                        return;
                    }
                    ConnectionEnd::Lost(reason) => {
                        warn!("Session {session_id} lost connection: {reason}");
                    }
                }
            }
            Err(e) => {
                warn!("Session {session_id} failed to open {}: {e}", shared.endpoint);
            }
        }

        let next_delay = backoff.next_backoff();
        if !shared
            .lifecycle
            .advance_counting(epoch, ConnectionState::Reconnecting, backoff.attempt())
        {
            return;
        }

        let Some(delay) = next_delay else {
            error!(
                "Session {session_id} giving up after {} reconnect attempt(s)",
                backoff.attempt()
            );
            shared.lifecycle.advance(epoch, ConnectionState::Failed);
            return;
        };

        info!(
            "Session {session_id} reconnecting in {delay:?} (attempt {})",
            backoff.attempt()
        );

        tokio::select! {
            biased;
            _ = &mut shutdown => {
                debug!("Session {session_id} retry cancelled");
                return;
            }
            _ = sleep(delay) => {}
        }

        if !shared.lifecycle.advance(epoch, ConnectionState::Connecting) {
            return;
        }
    }
}

/// Pump one open connection until it ends.
async fn serve(
    shared: &Shared,
    mut sink: FrameSink,
    mut stream: FrameStream,
    shutdown: &mut oneshot::Receiver<()>,
) -> ConnectionEnd {
    let mut heartbeat = Heartbeat::new(
        shared.config.heartbeat_interval(),
        shared.config.heartbeat_timeout(),
    );

    loop {
        let deadline = heartbeat.deadline();

        tokio::select! {
            biased;

            _ = &mut *shutdown => {
                close_quietly(sink).await;
                return ConnectionEnd::Shutdown;
            }

            _ = expired(deadline) => {
                return ConnectionEnd::Lost(format!(
                    "no heartbeat reply within {:?}",
                    heartbeat.timeout()
                ));
            }

            frame = stream.next() => match frame {
                Some(Ok(Frame::Text(text))) => handle_text(shared, &mut heartbeat, &text),
                Some(Ok(Frame::Pong(_))) => heartbeat.acknowledge(),
                Some(Ok(Frame::Ping(data))) => {
                    trace!("Ping from server ({} bytes)", data.len());
                }
                Some(Ok(Frame::Close)) => {
                    return ConnectionEnd::Lost(String::from("closed by server"));
                }
                Some(Err(e)) => return ConnectionEnd::Lost(e.to_string()),
                None => return ConnectionEnd::Lost(String::from("stream ended")),
            },

            _ = heartbeat.tick() => {
                match timeout(heartbeat.timeout(), sink.send(ping_frame())).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        return ConnectionEnd::Lost(format!("heartbeat send failed: {e}"));
                    }
                    Err(_) => {
                        return ConnectionEnd::Lost(format!(
                            "heartbeat send stalled for {:?}",
                            heartbeat.timeout()
                        ));
                    }
                }
                heartbeat.ping_sent();
                trace!("Heartbeat ping sent");
            }
        }
    }
}

fn handle_text(shared: &Shared, heartbeat: &mut Heartbeat, text: &str) {
    match InboundEvent::parse(text) {
        Ok(event) if is_pong(&event) => heartbeat.acknowledge(),
        Ok(event) => {
            let outcome = shared.dispatcher.deliver(&event);
            if outcome.invoked == 0 {
                trace!("No subscribers for {}", event.event_type);
            }
        }
        Err(e) => warn!("Dropping malformed frame: {e}"),
    }
}

async fn close_quietly(mut sink: FrameSink) {
    if let Err(e) = sink.send(Frame::Close).await {
        debug!("Close frame not sent: {e}");
    }
    if let Err(e) = sink.close().await {
        debug!("Transport close failed: {e}");
    }
}
