//! Event dispatcher.
//!
//! Routes decoded events to the handlers registered for their type. The
//! dispatcher has no notion of connection health: any frame the controller
//! hands it is delivered, even mid-transition.

use crate::error::dispatch::DispatchError;
use crate::events::{EventType, InboundEvent};

use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, error, trace};

pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;
pub type HandlerResult = Result<(), HandlerError>;

type HandlerFn = dyn Fn(&InboundEvent) -> HandlerResult + Send + Sync;

/// A subscriber callback.
///
/// Identity is by reference: clones of one handler are equal, two handlers
/// built from identical closures are not. Keep a clone to unsubscribe later.
#[derive(Clone)]
pub struct EventHandler(Arc<HandlerFn>);

impl EventHandler {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&InboundEvent) -> HandlerResult + Send + Sync + 'static,
    {
        Self(Arc::new(handler))
    }

    fn invoke(&self, event: &InboundEvent) -> HandlerResult {
        (self.0)(event)
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for EventHandler {}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Arc::as_ptr(&self.0))
    }
}

/// Result of delivering one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Handlers invoked, including those that failed.
    pub invoked: usize,
    /// Handlers that returned an error or panicked.
    pub failed: usize,
}

/// Mapping from event type to an insertion-ordered set of handlers.
#[derive(Default)]
pub struct Dispatcher {
    handlers: RwLock<HashMap<EventType, Vec<EventHandler>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `event_type`.
    ///
    /// Registering the same handler twice for one type is a no-op.
    pub fn subscribe(&self, event_type: EventType, handler: EventHandler) {
        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = handlers.entry(event_type.clone()).or_default();

        if entry.contains(&handler) {
            debug!("Handler {handler:?} already subscribed to {event_type}");
            return;
        }

        entry.push(handler);
        debug!(
            "Subscribed handler to {event_type} ({} registered)",
            entry.len()
        );
    }

    /// Remove exactly `handler` from `event_type`. No-op if it is not registered.
    ///
    /// An emptied collection stays in the map; later subscribes reuse it.
    pub fn unsubscribe(&self, event_type: &EventType, handler: &EventHandler) {
        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = handlers.get_mut(event_type) {
            let before = entry.len();
            entry.retain(|registered| registered != handler);
            if entry.len() < before {
                debug!(
                    "Unsubscribed handler from {event_type} ({} remaining)",
                    entry.len()
                );
            }
        }
    }

    /// Handlers currently subscribed to `event_type`.
    pub fn handler_count(&self, event_type: &EventType) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .map_or(0, Vec::len)
    }

    /// Parse a raw frame and deliver it.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Parse`] for a malformed frame; no handler runs.
    pub fn dispatch(&self, raw: &str) -> Result<DispatchOutcome, DispatchError> {
        let event = InboundEvent::parse(raw)?;
        Ok(self.deliver(&event))
    }

    /// Invoke every handler registered for the event's type, in registration order.
    ///
    /// Works on a snapshot taken before the first call, so handlers may
    /// subscribe or unsubscribe from inside a callback. A failing handler is
    /// logged and does not stop the rest.
    pub fn deliver(&self, event: &InboundEvent) -> DispatchOutcome {
        let snapshot = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event.event_type)
            .cloned()
            .unwrap_or_default();

        if snapshot.is_empty() {
            trace!("No handlers for {}", event.event_type);
            return DispatchOutcome::default();
        }

        let mut outcome = DispatchOutcome::default();
        for handler in &snapshot {
            outcome.invoked += 1;
            match catch_unwind(AssertUnwindSafe(|| handler.invoke(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    outcome.failed += 1;
                    error!("Handler {handler:?} for {} failed: {e}", event.event_type);
                }
                Err(_) => {
                    outcome.failed += 1;
                    error!("Handler {handler:?} for {} panicked", event.event_type);
                }
            }
        }

        trace!(
            "Delivered {} to {} handler(s), {} failed",
            event.event_type, outcome.invoked, outcome.failed
        );
        outcome
    }
}
