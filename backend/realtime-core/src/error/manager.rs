use crate::error::config::ConfigError;

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

/// Errors raised while building a manager.
///
/// Connection problems never show up here; they are reported through
/// connection-state transitions instead.
#[derive(Debug, ThisError)]
pub enum ManagerError {
    #[error("No Runtime Error: {message} {location}")]
    NoRuntime {
        message: String,
        location: ErrorLocation,
    },

    #[error("Manager Config Error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },
}

impl From<tokio::runtime::TryCurrentError> for ManagerError {
    #[track_caller]
    fn from(error: tokio::runtime::TryCurrentError) -> Self {
        ManagerError::NoRuntime {
            message: format!("RealtimeManager must be created inside a tokio runtime: {error}"),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
