//! Heartbeat probe for a live connection.
//!
//! While connected the session sends a ping every `interval`. The first
//! unacknowledged ping arms a deadline `timeout` later; a pong clears it.
//! Reaching the deadline means the connection is dead.

use crate::events::{EventType, InboundEvent};
use crate::transport::Frame;

use std::future::pending;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at, sleep_until};

pub const PING_TYPE: &str = "ping";
pub const PONG_TYPE: &str = "pong";

#[derive(Serialize)]
struct PingMessage {
    #[serde(rename = "type")]
    kind: &'static str,
    timestamp: u64,
}

pub(crate) struct Heartbeat {
    ticker: Interval,
    timeout: Duration,
    deadline: Option<Instant>,
}

impl Heartbeat {
    /// First tick fires one full `interval` after creation.
    pub(crate) fn new(interval: Duration, timeout: Duration) -> Self {
        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            ticker,
            timeout,
            deadline: None,
        }
    }

    pub(crate) async fn tick(&mut self) {
        self.ticker.tick().await;
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub(crate) fn ping_sent(&mut self) {
        if self.deadline.is_none() {
            self.deadline = Some(Instant::now() + self.timeout);
        }
    }

    pub(crate) fn acknowledge(&mut self) {
        self.deadline = None;
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Resolves at `deadline`, or never when there is none.
pub(crate) async fn expired(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending::<()>().await,
    }
}

/// `{"type":"ping","timestamp":<unix ms>}`
pub fn ping_frame() -> Frame {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default();

    let message = PingMessage {
        kind: PING_TYPE,
        timestamp,
    };
    Frame::Text(serde_json::to_string(&message).unwrap_or_default())
}

/// Whether a decoded event is the server's heartbeat reply.
pub fn is_pong(event: &InboundEvent) -> bool {
    matches!(&event.event_type, EventType::Custom(custom) if custom.as_str() == PONG_TYPE)
}
