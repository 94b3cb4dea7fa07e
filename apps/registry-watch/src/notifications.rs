//! User-facing notifications for connection-state changes.
//!
//! Mirrors what a UI toast layer shows: good news when connected, a warning
//! while retrying, a sticky error once the manager gives up. The watcher
//! renders them as log lines.

use realtime_core::{ConnectionState, StateObserver};

use std::sync::{Arc, Mutex, PoisonError};

use log::{error, info, warn};
use serde::Serialize;

pub const CONNECTED_MESSAGE: &str = "Real-time updates connected";
pub const RECONNECTING_MESSAGE: &str = "Connection lost. Reconnecting...";
pub const FAILED_MESSAGE: &str = "Unable to connect to real-time updates. Please refresh to retry.";
pub const DISCONNECTED_MESSAGE: &str = "Real-time updates disconnected";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: &'static str,
    /// Stays on screen until dismissed.
    pub persistent: bool,
}

impl Notification {
    fn transient(level: NotificationLevel, message: &'static str) -> Self {
        Self {
            level,
            message,
            persistent: false,
        }
    }
}

/// Notification for the transition `previous -> next`, if any.
///
/// A `disconnected` right after `connecting` is a handshake that never got
/// anywhere and stays quiet.
pub fn notification_for(previous: ConnectionState, next: ConnectionState) -> Option<Notification> {
    match next {
        ConnectionState::Connected => Some(Notification::transient(
            NotificationLevel::Success,
            CONNECTED_MESSAGE,
        )),
        ConnectionState::Reconnecting => Some(Notification::transient(
            NotificationLevel::Warning,
            RECONNECTING_MESSAGE,
        )),
        ConnectionState::Failed => Some(Notification {
            level: NotificationLevel::Error,
            message: FAILED_MESSAGE,
            persistent: true,
        }),
        ConnectionState::Disconnected if previous != ConnectionState::Connecting => Some(
            Notification::transient(NotificationLevel::Info, DISCONNECTED_MESSAGE),
        ),
        ConnectionState::Disconnected | ConnectionState::Idle | ConnectionState::Connecting => None,
    }
}

/// Tracks the previous state so single-state observer callbacks can be
/// mapped with [`notification_for`].
#[derive(Debug, Default)]
pub struct StateNotifier {
    previous: Mutex<ConnectionState>,
}

impl StateNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `next` and return its notification.
    pub fn notify(&self, next: ConnectionState) -> Option<Notification> {
        let mut previous = self.previous.lock().unwrap_or_else(PoisonError::into_inner);
        let prior = std::mem::replace(&mut *previous, next);
        notification_for(prior, next)
    }

    /// Observer that feeds transitions through this notifier into `sink`.
    pub fn observer<F>(self: &Arc<Self>, sink: F) -> StateObserver
    where
        F: Fn(Notification) + Send + Sync + 'static,
    {
        let notifier = Arc::clone(self);
        StateObserver::new(move |state| {
            if let Some(notification) = notifier.notify(state) {
                sink(notification);
            }
        })
    }
}

/// Log a notification at the level matching its severity.
pub fn render(notification: &Notification) {
    let Notification {
        level,
        message,
        persistent,
    } = notification;
    match level {
        NotificationLevel::Success | NotificationLevel::Info => info!("{message}"),
        NotificationLevel::Warning => warn!("{message}"),
        NotificationLevel::Error if *persistent => error!("{message} (persistent)"),
        NotificationLevel::Error => error!("{message}"),
    }
}
