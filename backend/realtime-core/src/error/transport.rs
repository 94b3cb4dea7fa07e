use common::ErrorLocation;

use std::panic::Location;
use std::time::Duration;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum TransportError {
    #[error("Connect Error: {message} {location}")]
    Connect {
        message: String,
        location: ErrorLocation,
    },

    #[error("Connect Timeout Error: no handshake after {timeout:?} {location}")]
    Timeout {
        timeout: Duration,
        location: ErrorLocation,
    },

    #[error("Send Error: {message} {location}")]
    Send {
        message: String,
        location: ErrorLocation,
    },

    #[error("Receive Error: {message} {location}")]
    Receive {
        message: String,
        location: ErrorLocation,
    },
}

impl TransportError {
    #[track_caller]
    pub fn connect(message: impl Into<String>) -> Self {
        TransportError::Connect {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn timeout(timeout: Duration) -> Self {
        TransportError::Timeout {
            timeout,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn send(message: impl Into<String>) -> Self {
        TransportError::Send {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn receive(message: impl Into<String>) -> Self {
        TransportError::Receive {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
