//! Real-time connection and event distribution for registry clients.
//!
//! A [`RealtimeManager`] keeps one persistent WebSocket connection to the
//! registry event endpoint, reconnects with exponential backoff when it drops,
//! probes it with a heartbeat, and fans decoded events out to any number of
//! in-process subscribers.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod heartbeat;
pub mod manager;
pub mod retry;
pub mod state;
pub mod transport;

#[cfg(test)]
mod tests;

pub use config::ManagerConfig;
pub use dispatcher::{DispatchOutcome, Dispatcher, EventHandler, HandlerError, HandlerResult};
pub use events::{EventTimestamp, EventType, InboundEvent};
pub use manager::{RealtimeManager, SharedManager, StateObserver};
pub use state::ConnectionState;

pub const DEFAULT_ENDPOINT_HOST: &str = "127.0.0.1";
pub const DEFAULT_ENDPOINT_PORT: u16 = 8080;
pub const DEFAULT_ENDPOINT_PATH: &str = "/ws";
pub const DEFAULT_ENDPOINT: &str = const_format::concatcp!(
    "ws://",
    DEFAULT_ENDPOINT_HOST,
    ":",
    DEFAULT_ENDPOINT_PORT,
    DEFAULT_ENDPOINT_PATH
);
