//! Where the watcher reads config and writes logs.

use crate::error::AppError;

use common::ErrorLocation;

use std::env;
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::panic::Location;
use std::path::PathBuf;

/// Points config and logs at one directory, bypassing platform detection.
pub const CONFIG_DIR_ENV: &str = "REGISTRY_WATCH_CONFIG_DIR";

const APP_DIR_NAME: &str = "registry-watch";
const LOG_DIR_NAME: &str = "logs";

/// How [`detect_paths`] chose the directories, for the startup log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSource {
    EnvVar,
    PlatformDefault,
}

impl Display for PathSource {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        match self {
            PathSource::EnvVar => write!(formatter, "{CONFIG_DIR_ENV} override"),
            PathSource::PlatformDefault => formatter.write_str("platform defaults"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchPaths {
    /// Holds `realtime.toml`.
    pub config_dir: PathBuf,
    pub log_dir: PathBuf,
    pub source: PathSource,
}

/// Resolve config and log directories.
///
/// Runs before logging is up; the caller logs the result and its source.
///
/// # Platform Behavior
/// - **Linux**: `$XDG_CONFIG_HOME/registry-watch`, logs under `$XDG_DATA_HOME/registry-watch/logs`
/// - **macOS**: `~/Library/Application Support/registry-watch`
/// - **Windows**: `%APPDATA%/registry-watch`
///
/// # Errors
///
/// Returns [`AppError::Paths`] if there is no override and the platform has no
/// config directory.
pub fn detect_paths() -> Result<WatchPaths, AppError> {
    if let Ok(custom_dir) = env::var(CONFIG_DIR_ENV) {
        let config_dir = PathBuf::from(custom_dir);
        return Ok(WatchPaths {
            log_dir: config_dir.join(LOG_DIR_NAME),
            config_dir,
            source: PathSource::EnvVar,
        });
    }

    let Some(config_root) = dirs::config_dir() else {
        return Err(AppError::Paths {
            message: format!("No platform config directory; set {CONFIG_DIR_ENV}"),
            location: ErrorLocation::from(Location::caller()),
        });
    };
    let config_dir = config_root.join(APP_DIR_NAME);

    // Without a data directory, logs sit under the config directory
    let log_dir = match dirs::data_local_dir() {
        Some(data_dir) => data_dir.join(APP_DIR_NAME).join(LOG_DIR_NAME),
        None => config_dir.join(LOG_DIR_NAME),
    };

    Ok(WatchPaths {
        config_dir,
        log_dir,
        source: PathSource::PlatformDefault,
    })
}

/// Load `.env` from the working directory, then from next to the executable.
///
/// Runs before logging is up, so the caller logs the returned path.
pub fn load_dotenv() -> Option<PathBuf> {
    if let Ok(path) = dotenvy::dotenv() {
        return Some(path);
    }

    let exe_path = env::current_exe().ok()?;
    let env_path = exe_path.parent()?.join(".env");
    if !env_path.exists() {
        return None;
    }
    dotenvy::from_path(&env_path).ok().map(|()| env_path)
}
