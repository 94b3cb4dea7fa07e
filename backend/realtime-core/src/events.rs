//! Inbound event model.
//!
//! Frames are JSON text carrying at least a `type` discriminator. The payload
//! is opaque to the dispatcher; subscribers decode it with
//! [`InboundEvent::payload_as`].

use crate::error::dispatch::DispatchError;

use common::ErrorLocation;

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::panic::Location;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const EVENT_TYPE_PATTERN: &str = r"^[A-Za-z0-9_][A-Za-z0-9_.:-]*$";
const EVENT_TYPE_MAX_LEN: usize = 128;

static EVENT_TYPE_REGEX: OnceLock<Regex> = OnceLock::new();

pub(crate) fn get_event_type_regex() -> &'static Regex {
    EVENT_TYPE_REGEX.get_or_init(|| Regex::new(EVENT_TYPE_PATTERN).expect("valid regex pattern"))
}

/// Event-type discriminator.
///
/// The seven registry events are named variants. Anything else is a
/// [`EventType::Custom`], which can only be built through [`EventType::parse`]
/// and is therefore always a well-formed name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EventType {
    ServiceRegistered,
    ServiceUnregistered,
    InstanceRegistered,
    InstanceUnregistered,
    InstanceStatusChanged,
    ClusterNodeAdded,
    ClusterNodeRemoved,
    Custom(CustomEventType),
}

/// A validated event-type name outside the recognized set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomEventType(String);

impl CustomEventType {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl EventType {
    /// The recognized registry events, in declaration order.
    pub const KNOWN: [EventType; 7] = [
        EventType::ServiceRegistered,
        EventType::ServiceUnregistered,
        EventType::InstanceRegistered,
        EventType::InstanceUnregistered,
        EventType::InstanceStatusChanged,
        EventType::ClusterNodeAdded,
        EventType::ClusterNodeRemoved,
    ];

    /// Parse a discriminator, mapping recognized literals to their variant.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidEventType`] if the name is empty, too long,
    /// or contains characters outside `[A-Za-z0-9_.:-]`.
    #[track_caller]
    pub fn parse(name: &str) -> Result<Self, DispatchError> {
        let known = match name {
            "service.registered" => Some(EventType::ServiceRegistered),
            "service.unregistered" => Some(EventType::ServiceUnregistered),
            "instance.registered" => Some(EventType::InstanceRegistered),
            "instance.unregistered" => Some(EventType::InstanceUnregistered),
            "instance.status_changed" => Some(EventType::InstanceStatusChanged),
            "cluster.node_added" => Some(EventType::ClusterNodeAdded),
            "cluster.node_removed" => Some(EventType::ClusterNodeRemoved),
            _ => None,
        };
        if let Some(event_type) = known {
            return Ok(event_type);
        }

        if name.is_empty() {
            return Err(DispatchError::invalid_event_type(name, "event type is empty"));
        }
        if name.len() > EVENT_TYPE_MAX_LEN {
            return Err(DispatchError::invalid_event_type(
                name,
                format!("event type longer than {EVENT_TYPE_MAX_LEN} characters"),
            ));
        }
        if !get_event_type_regex().is_match(name) {
            return Err(DispatchError::invalid_event_type(
                name,
                "event type contains invalid characters",
            ));
        }

        Ok(EventType::Custom(CustomEventType(name.to_string())))
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventType::ServiceRegistered => "service.registered",
            EventType::ServiceUnregistered => "service.unregistered",
            EventType::InstanceRegistered => "instance.registered",
            EventType::InstanceUnregistered => "instance.unregistered",
            EventType::InstanceStatusChanged => "instance.status_changed",
            EventType::ClusterNodeAdded => "cluster.node_added",
            EventType::ClusterNodeRemoved => "cluster.node_removed",
            EventType::Custom(custom) => custom.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, EventType::Custom(_))
    }
}

impl FromStr for EventType {
    type Err = DispatchError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        EventType::parse(name)
    }
}

impl TryFrom<String> for EventType {
    type Error = DispatchError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        EventType::parse(&name)
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        event_type.as_str().to_string()
    }
}

impl Display for EventType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(self.as_str())
    }
}

/// Server timestamp, either unix milliseconds or a preformatted string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTimestamp {
    Millis(i64),
    Text(String),
}

/// A decoded server message. Not retained after dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,

    #[serde(default, alias = "data")]
    pub payload: Value,

    #[serde(default)]
    pub timestamp: Option<EventTimestamp>,
}

impl InboundEvent {
    /// Decode one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Parse`] if the frame is not a JSON object with a
    /// valid string `type` field.
    pub fn parse(raw: &str) -> Result<Self, DispatchError> {
        let value: Value = serde_json::from_str(raw)?;
        if !value.is_object() {
            return Err(DispatchError::Parse {
                message: String::from("frame is not a JSON object"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Decode the payload into a caller-chosen shape.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, DispatchError> {
        Ok(T::deserialize(&self.payload)?)
    }
}
