use crate::error::AppError;
use crate::event_log::{event_logger, watched_types};
use crate::notifications::{Notification, StateNotifier, render};

use realtime_core::{EventHandler, ManagerConfig, RealtimeManager, SharedManager, StateObserver};

use std::sync::Arc;

use log::info;

/// Composition root for the watcher.
///
/// Owns the one [`SharedManager`] the process uses, plus the notification
/// observer and event logger wired into it. The manager itself is built
/// lazily on first use, inside the tokio runtime.
pub struct AppState {
    realtime: SharedManager,
    notifier: Arc<StateNotifier>,
    observer: StateObserver,
    event_logger: EventHandler,
}

impl AppState {
    pub fn new(config: ManagerConfig) -> Self {
        Self::with_notification_sink(config, |notification| render(&notification))
    }

    /// Like [`new`](Self::new) but notifications go to `sink` instead of the log.
    pub fn with_notification_sink<F>(config: ManagerConfig, sink: F) -> Self
    where
        F: Fn(Notification) + Send + Sync + 'static,
    {
        let notifier = Arc::new(StateNotifier::new());
        let observer = notifier.observer(sink);
        Self {
            realtime: SharedManager::new(config),
            notifier,
            observer,
            event_logger: event_logger(),
        }
    }

    /// The shared manager, built on first call.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Realtime`] when called outside a tokio runtime or
    /// with a config the manager rejects.
    pub fn realtime(&self) -> Result<&RealtimeManager, AppError> {
        Ok(self.realtime.get()?)
    }

    pub fn notifier(&self) -> &Arc<StateNotifier> {
        &self.notifier
    }

    /// Wire notifications and event logging, then connect.
    ///
    /// Calling this again re-registers nothing and leaves an active
    /// connection alone.
    pub fn start(&self) -> Result<RealtimeManager, AppError> {
        let manager = self.realtime()?.clone();

        manager.on_state_change(self.observer.clone());
        for event_type in watched_types() {
            manager.subscribe(event_type, self.event_logger.clone());
        }

        info!("Connecting to {}", manager.config().endpoint);
        manager.connect();
        Ok(manager)
    }

    /// Disconnect if the manager was ever built.
    pub fn stop(&self) {
        if let Some(manager) = self.realtime.get_if_created() {
            info!("Disconnecting from {}", manager.config().endpoint);
            manager.disconnect();
        }
    }
}
