//! Manager configuration.
//!
//! Values are fixed when a manager is constructed. They come from
//! `{config_dir}/realtime.toml`, optionally overridden by `REALTIME_*`
//! environment variables.

use crate::DEFAULT_ENDPOINT;
use crate::error::config::ConfigError;

use common::ErrorLocation;

use std::env;
use std::panic::Location;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use url::Url;

const CONFIG_FILE_NAME: &str = "realtime.toml";

/// Overrides [`ManagerConfig::endpoint`].
pub const ENV_ENDPOINT: &str = "REALTIME_ENDPOINT";
/// Overrides [`ManagerConfig::base_reconnect_delay_ms`].
pub const ENV_BASE_DELAY_MS: &str = "REALTIME_BASE_DELAY_MS";
/// Overrides [`ManagerConfig::max_reconnect_delay_ms`].
pub const ENV_MAX_DELAY_MS: &str = "REALTIME_MAX_DELAY_MS";
/// Overrides [`ManagerConfig::max_reconnect_attempts`].
pub const ENV_MAX_ATTEMPTS: &str = "REALTIME_MAX_ATTEMPTS";
/// Overrides [`ManagerConfig::heartbeat_interval_ms`].
pub const ENV_HEARTBEAT_INTERVAL_MS: &str = "REALTIME_HEARTBEAT_INTERVAL_MS";
/// Overrides [`ManagerConfig::heartbeat_timeout_ms`].
pub const ENV_HEARTBEAT_TIMEOUT_MS: &str = "REALTIME_HEARTBEAT_TIMEOUT_MS";
/// Overrides [`ManagerConfig::connect_timeout_ms`].
pub const ENV_CONNECT_TIMEOUT_MS: &str = "REALTIME_CONNECT_TIMEOUT_MS";

// ============================================
// CONFIG STRUCT
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManagerConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_base_reconnect_delay_ms")]
    pub base_reconnect_delay_ms: u64,

    #[serde(default = "default_max_reconnect_delay_ms")]
    pub max_reconnect_delay_ms: u64,

    /// Retries allowed after a failure before the manager gives up and enters `failed`.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,

    #[serde(default = "default_heartbeat_timeout_ms")]
    pub heartbeat_timeout_ms: u64,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            base_reconnect_delay_ms: default_base_reconnect_delay_ms(),
            max_reconnect_delay_ms: default_max_reconnect_delay_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            heartbeat_timeout_ms: default_heartbeat_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}
fn default_base_reconnect_delay_ms() -> u64 {
    1_000
}
fn default_max_reconnect_delay_ms() -> u64 {
    30_000
}
fn default_max_reconnect_attempts() -> u32 {
    10
}
fn default_heartbeat_interval_ms() -> u64 {
    30_000
}
fn default_heartbeat_timeout_ms() -> u64 {
    10_000
}
fn default_connect_timeout_ms() -> u64 {
    10_000
}

// ============================================
// IMPLEMENTATION
// ============================================

impl ManagerConfig {
    /// Load config from `{config_dir}/realtime.toml`.
    ///
    /// # Returns
    ///
    /// Returns defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read, parsed or validated.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file {}: {}", config_path.display(), e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        let config: ManagerConfig = toml::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config TOML {}: {}", config_path.display(), e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Apply `REALTIME_*` environment variable overrides, then re-validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EnvOverride`] if a numeric variable does not parse,
    /// or [`ConfigError::ValidationError`] if the merged config is invalid.
    pub fn apply_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(endpoint) = env::var(ENV_ENDPOINT) {
            info!("Endpoint overridden by {ENV_ENDPOINT}");
            self.endpoint = endpoint;
        }

        override_number(ENV_BASE_DELAY_MS, &mut self.base_reconnect_delay_ms)?;
        override_number(ENV_MAX_DELAY_MS, &mut self.max_reconnect_delay_ms)?;
        override_number(ENV_MAX_ATTEMPTS, &mut self.max_reconnect_attempts)?;
        override_number(ENV_HEARTBEAT_INTERVAL_MS, &mut self.heartbeat_interval_ms)?;
        override_number(ENV_HEARTBEAT_TIMEOUT_MS, &mut self.heartbeat_timeout_ms)?;
        override_number(ENV_CONNECT_TIMEOUT_MS, &mut self.connect_timeout_ms)?;

        self.validate()?;
        Ok(self)
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint_url()?;

        let non_zero = [
            ("base_reconnect_delay_ms", self.base_reconnect_delay_ms),
            ("max_reconnect_delay_ms", self.max_reconnect_delay_ms),
            ("heartbeat_interval_ms", self.heartbeat_interval_ms),
            ("heartbeat_timeout_ms", self.heartbeat_timeout_ms),
            ("connect_timeout_ms", self.connect_timeout_ms),
        ];
        for (name, value) in non_zero {
            if value == 0 {
                return Err(ConfigError::ValidationError {
                    location: ErrorLocation::from(Location::caller()),
                    reason: format!("{name} must be greater than zero"),
                });
            }
        }

        if self.base_reconnect_delay_ms > self.max_reconnect_delay_ms {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "base_reconnect_delay_ms ({}) exceeds max_reconnect_delay_ms ({})",
                    self.base_reconnect_delay_ms, self.max_reconnect_delay_ms
                ),
            });
        }

        Ok(())
    }

    /// Parsed endpoint. Only `ws://` and `wss://` are accepted.
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.endpoint).map_err(|e| ConfigError::ValidationError {
            location: ErrorLocation::from(Location::caller()),
            reason: format!("Invalid endpoint URL {:?}: {e}", self.endpoint),
        })?;

        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("Endpoint scheme must be ws or wss, got {other:?}"),
            }),
        }
    }

    /// Delay before the first retry.
    pub fn base_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.base_reconnect_delay_ms)
    }

    /// Upper bound on any single retry delay.
    pub fn max_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.max_reconnect_delay_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_millis(self.heartbeat_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[track_caller]
fn override_number<T>(variable: &'static str, target: &mut T) -> Result<(), ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Ok(value) = env::var(variable) else {
        return Ok(());
    };

    let parsed = value.trim().parse::<T>().map_err(|e| ConfigError::EnvOverride {
        location: ErrorLocation::from(Location::caller()),
        variable,
        value: value.clone(),
        reason: e.to_string(),
    })?;

    info!("{variable} override applied");
    *target = parsed;
    Ok(())
}
