use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum DispatchError {
    #[error("Frame Parse Error: {message} {location}")]
    Parse {
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid Event Type Error: {name:?}: {message} {location}")]
    InvalidEventType {
        name: String,
        message: String,
        location: ErrorLocation,
    },
}

impl DispatchError {
    #[track_caller]
    pub fn invalid_event_type(name: impl Into<String>, message: impl Into<String>) -> Self {
        DispatchError::InvalidEventType {
            name: name.into(),
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<serde_json::Error> for DispatchError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        DispatchError::Parse {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
