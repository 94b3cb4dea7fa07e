//! Logs every registry event the watcher receives.

use realtime_core::{EventHandler, EventTimestamp, EventType, InboundEvent};

use log::info;

/// One line per event: type, server timestamp when present, payload.
pub fn describe(event: &InboundEvent) -> String {
    match &event.timestamp {
        Some(EventTimestamp::Millis(millis)) => {
            format!("{} @{millis} {}", event.event_type, event.payload)
        }
        Some(EventTimestamp::Text(text)) => format!("{} @{text} {}", event.event_type, event.payload),
        None => format!("{} {}", event.event_type, event.payload),
    }
}

pub fn event_logger() -> EventHandler {
    EventHandler::new(|event| {
        info!("Registry event: {}", describe(event));
        Ok(())
    })
}

/// Every recognized registry event type.
pub fn watched_types() -> impl Iterator<Item = EventType> {
    EventType::KNOWN.into_iter()
}
