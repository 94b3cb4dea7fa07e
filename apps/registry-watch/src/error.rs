use common::ErrorLocation;

use realtime_core::error::config::ConfigError;
use realtime_core::error::manager::ManagerError;

use thiserror::Error;

/// Errors that stop the watcher from starting.
///
/// Connection trouble is not an error here; it arrives as state
/// notifications once the manager is running.
#[derive(Debug, Error)]
pub enum AppError {
    /// Error from this App
    #[error("Registry Watch Error: {message} {location}")]
    App {
        message: String,
        location: ErrorLocation,
    },

    /// Logging could not be set up
    #[error("Logger Error: {message} {location}")]
    Logger {
        message: String,
        location: ErrorLocation,
    },

    /// Config directory could not be resolved
    #[error("Paths Error: {message} {location}")]
    Paths {
        message: String,
        location: ErrorLocation,
    },

    #[error("Config Error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Realtime Error: {source}")]
    Realtime {
        #[from]
        source: ManagerError,
    },
}
