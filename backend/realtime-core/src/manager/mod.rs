//! Connection lifecycle controller and public manager handle.
//!
//! [`RealtimeManager`] is a cheap `Clone` handle over one shared instance
//! holding the lifecycle state, the dispatcher and the transport. Every
//! explicit [`connect`](RealtimeManager::connect) starts a session task on the
//! runtime captured at construction; the task drives
//! `connecting -> connected -> reconnecting -> ...` and reports each step back
//! through the lifecycle so observers are notified in order.
//!
//! Expected network conditions never surface as errors. Callers learn about
//! them only through state-change notifications.

pub(crate) mod lifecycle;
mod session;
mod shared;

pub use lifecycle::StateObserver;
pub use shared::SharedManager;

use crate::config::ManagerConfig;
use crate::dispatcher::{Dispatcher, EventHandler};
use crate::error::manager::ManagerError;
use crate::events::EventType;
use crate::state::ConnectionState;
use crate::transport::{Transport, WsTransport};

use lifecycle::Lifecycle;

use std::sync::Arc;

use log::{debug, info};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use url::Url;

pub(crate) struct Shared {
    pub(crate) config: ManagerConfig,
    pub(crate) endpoint: Url,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) dispatcher: Dispatcher,
}

/// Handle to the single real-time connection.
#[derive(Clone)]
pub struct RealtimeManager {
    shared: Arc<Shared>,
    runtime: Handle,
}

impl RealtimeManager {
    /// Build a manager that connects over WebSocket.
    ///
    /// # Errors
    ///
    /// - [`ManagerError::Config`] if the config does not validate
    /// - [`ManagerError::NoRuntime`] if called outside a tokio runtime
    pub fn new(config: ManagerConfig) -> Result<Self, ManagerError> {
        Self::with_transport(config, Arc::new(WsTransport::new()))
    }

    /// Build a manager over a caller-supplied transport.
    pub fn with_transport(
        config: ManagerConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ManagerError> {
        config.validate()?;
        let endpoint = config.endpoint_url()?;
        let runtime = Handle::try_current()?;

        info!("Realtime manager created for {endpoint}");

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                endpoint,
                transport,
                lifecycle: Lifecycle::new(),
                dispatcher: Dispatcher::new(),
            }),
            runtime,
        })
    }

    /// Open the connection.
    ///
    /// No-op while `connecting` or `connected`. From any other state this
    /// enters `connecting` immediately and starts a fresh session; a retry
    /// pending in `reconnecting` is cancelled and the backoff starts over.
    pub fn connect(&self) {
        let (epoch, shutdown_rx) = {
            let mut inner = self.shared.lifecycle.lock();
            if inner.state().is_active() {
                debug!("connect() ignored while {}", inner.state());
                return;
            }

            let epoch = inner.begin_epoch();
            inner.reset_attempts();
            let (shutdown_tx, shutdown_rx) = oneshot::channel();
            inner.install_shutdown(shutdown_tx);
            inner.set_state(ConnectionState::Connecting);
            (epoch, shutdown_rx)
        };

        self.runtime
            .spawn(session::run(Arc::clone(&self.shared), epoch, shutdown_rx));
        self.shared.lifecycle.flush();
    }

    /// Close the connection and stay closed.
    ///
    /// Cancels any pending retry and the heartbeat; once this returns no
    /// timer from the old session can change state or reconnect. The
    /// transport is closed by the session task as it winds down.
    pub fn disconnect(&self) {
        {
            let mut inner = self.shared.lifecycle.lock();
            inner.begin_epoch();
            inner.reset_attempts();
            inner.set_state(ConnectionState::Disconnected);
        }
        self.shared.lifecycle.flush();
    }

    /// Current connection state. Never blocks on the session task.
    pub fn get_state(&self) -> ConnectionState {
        self.shared.lifecycle.state()
    }

    /// Failures since the last successful open.
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.lifecycle.attempts()
    }

    /// Register a state observer. Registering the same observer twice has no effect.
    pub fn on_state_change(&self, observer: StateObserver) {
        self.shared.lifecycle.add_observer(observer);
    }

    /// Remove an observer registered with [`on_state_change`](Self::on_state_change).
    ///
    /// Unknown observers are ignored. Takes effect from the next transition.
    pub fn off_state_change(&self, observer: &StateObserver) {
        self.shared.lifecycle.remove_observer(observer);
    }

    /// Deliver every inbound event of `event_type` to `handler`.
    ///
    /// Works before `connect()`; subscriptions survive reconnects.
    pub fn subscribe(&self, event_type: EventType, handler: EventHandler) {
        self.shared.dispatcher.subscribe(event_type, handler);
    }

    /// Stop delivering `event_type` to `handler`. No-op if it was never subscribed.
    pub fn unsubscribe(&self, event_type: &EventType, handler: &EventHandler) {
        self.shared.dispatcher.unsubscribe(event_type, handler);
    }

    /// The validated configuration this manager was built with.
    pub fn config(&self) -> &ManagerConfig {
        &self.shared.config
    }

    /// The event dispatcher, for inspecting subscriptions.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.shared.dispatcher
    }

    /// Whether two handles refer to the same manager.
    pub fn same_instance(&self, other: &RealtimeManager) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}
