// Unit tests for config loading, env overrides and validation

use crate::DEFAULT_ENDPOINT;
use crate::config::{
    ENV_BASE_DELAY_MS, ENV_ENDPOINT, ENV_MAX_ATTEMPTS, ManagerConfig,
};
use crate::error::config::ConfigError;

use std::fs;
use std::time::Duration;

use serial_test::serial;
use tempfile::TempDir;

/// Sets environment variables for the duration of a test.
struct EnvGuard(Vec<&'static str>);

impl EnvGuard {
    fn set(vars: &[(&'static str, &str)]) -> Self {
        for (name, value) in vars {
            // SAFETY: env tests are #[serial], no other thread touches the environment.
            unsafe { std::env::set_var(name, value) };
        }
        Self(vars.iter().map(|(name, _)| *name).collect())
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for name in &self.0 {
            // SAFETY: see EnvGuard::set.
            unsafe { std::env::remove_var(name) };
        }
    }
}

fn write_config(contents: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("realtime.toml"), contents).unwrap();
    dir
}

// ============================================
// DEFAULTS AND LOADING
// ============================================

/// **VALUE**: Verifies the documented defaults.
///
/// **WHY THIS MATTERS**: Deployments without a config file run on these values. A
/// silently changed default changes retry pressure on every backend.
///
/// **BUG THIS CATCHES**: Would catch a default function returning the wrong unit
/// (seconds instead of milliseconds) or a default that fails its own validation.
#[test]
fn given_defaults_when_inspected_then_match_documented_values_and_validate() {
    let config = ManagerConfig::default();

    assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    assert_eq!(config.base_reconnect_delay(), Duration::from_secs(1));
    assert_eq!(config.max_reconnect_delay(), Duration::from_secs(30));
    assert_eq!(config.max_reconnect_attempts, 10);
    assert_eq!(config.heartbeat_interval(), Duration::from_secs(30));
    assert_eq!(config.heartbeat_timeout(), Duration::from_secs(10));
    assert_eq!(config.connect_timeout(), Duration::from_secs(10));
    assert!(config.validate().is_ok());
}

#[test]
fn given_missing_file_when_load_then_returns_defaults() {
    let dir = TempDir::new().unwrap();

    let config = ManagerConfig::load(dir.path()).unwrap();

    assert_eq!(config, ManagerConfig::default());
}

/// **VALUE**: Verifies partial files are merged over defaults.
///
/// **WHY THIS MATTERS**: Operators typically only set the endpoint. Requiring every
/// field would make the file brittle across upgrades.
///
/// **BUG THIS CATCHES**: Would catch a missing `#[serde(default)]` on any field.
#[test]
fn given_partial_file_when_load_then_unset_fields_use_defaults() {
    // GIVEN: Only endpoint and attempts set
    let dir = write_config(
        r#"
endpoint = "wss://registry.example.com/events"
max_reconnect_attempts = 4
"#,
    );

    // WHEN: Loading
    let config = ManagerConfig::load(dir.path()).unwrap();

    // THEN: Set fields applied, rest defaulted
    assert_eq!(config.endpoint, "wss://registry.example.com/events");
    assert_eq!(config.max_reconnect_attempts, 4);
    assert_eq!(config.base_reconnect_delay_ms, 1_000);
    assert_eq!(config.heartbeat_interval_ms, 30_000);
}

#[test]
fn given_invalid_toml_when_load_then_returns_parse_error() {
    let dir = write_config("endpoint = [not toml");

    let result = ManagerConfig::load(dir.path());

    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

#[test]
fn given_unknown_key_when_load_then_returns_parse_error() {
    // Typos must not be silently ignored.
    let dir = write_config("heartbeat_intervall_ms = 5000");

    let result = ManagerConfig::load(dir.path());

    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

#[test]
fn given_file_with_invalid_values_when_load_then_returns_validation_error() {
    let dir = write_config("base_reconnect_delay_ms = 0");

    let result = ManagerConfig::load(dir.path());

    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}

// ============================================
// VALIDATION
// ============================================

/// **VALUE**: Verifies only WebSocket endpoints are accepted.
///
/// **WHY THIS MATTERS**: An `http://` URL fails at handshake time on every attempt,
/// burning the whole retry budget before anyone sees the real mistake.
///
/// **BUG THIS CATCHES**: Would catch a scheme check that was dropped or loosened.
#[test]
fn given_non_websocket_endpoint_when_validate_then_rejected() {
    for endpoint in ["http://localhost:8080/ws", "localhost:8080", "not a url", ""] {
        let config = ManagerConfig {
            endpoint: endpoint.to_string(),
            ..ManagerConfig::default()
        };
        assert!(
            matches!(config.validate(), Err(ConfigError::ValidationError { .. })),
            "{endpoint:?} should be rejected"
        );
    }

    let secure = ManagerConfig {
        endpoint: String::from("wss://registry.example.com/events"),
        ..ManagerConfig::default()
    };
    assert!(secure.validate().is_ok());
}

#[test]
fn given_zero_timing_when_validate_then_rejected() {
    let cases = [
        ManagerConfig {
            base_reconnect_delay_ms: 0,
            ..ManagerConfig::default()
        },
        ManagerConfig {
            heartbeat_interval_ms: 0,
            ..ManagerConfig::default()
        },
        ManagerConfig {
            heartbeat_timeout_ms: 0,
            ..ManagerConfig::default()
        },
        ManagerConfig {
            connect_timeout_ms: 0,
            ..ManagerConfig::default()
        },
    ];

    for config in cases {
        assert!(config.validate().is_err(), "{config:?} should be rejected");
    }
}

#[test]
fn given_zero_attempts_when_validate_then_accepted() {
    // Zero retries is a legitimate "fail fast" setting.
    let config = ManagerConfig {
        max_reconnect_attempts: 0,
        ..ManagerConfig::default()
    };

    assert!(config.validate().is_ok());
}

#[test]
fn given_base_delay_above_max_when_validate_then_rejected() {
    let config = ManagerConfig {
        base_reconnect_delay_ms: 5_000,
        max_reconnect_delay_ms: 1_000,
        ..ManagerConfig::default()
    };

    let error = config.validate().unwrap_err();

    assert!(error.to_string().contains("exceeds max_reconnect_delay_ms"));
}

// ============================================
// ENVIRONMENT OVERRIDES
// ============================================

/// **VALUE**: Verifies `REALTIME_*` variables override file values.
///
/// **WHY THIS MATTERS**: Containers configure through the environment; a file
/// baked into the image must not win.
///
/// **BUG THIS CATCHES**: Would catch overrides applied to the wrong field or
/// applied before the file is read.
#[test]
#[serial]
fn given_env_overrides_when_applied_then_take_precedence() {
    // GIVEN: File and environment disagree
    let dir = write_config("max_reconnect_attempts = 4");
    let _env = EnvGuard::set(&[
        (ENV_ENDPOINT, "ws://10.0.0.5:9000/events"),
        (ENV_MAX_ATTEMPTS, " 7 "),
    ]);

    // WHEN: Loading and applying overrides
    let config = ManagerConfig::load(dir.path())
        .and_then(ManagerConfig::apply_env_overrides)
        .unwrap();

    // THEN: Environment wins
    assert_eq!(config.endpoint, "ws://10.0.0.5:9000/events");
    assert_eq!(config.max_reconnect_attempts, 7);
}

#[test]
#[serial]
fn given_unparseable_env_number_when_applied_then_returns_env_override_error() {
    let _env = EnvGuard::set(&[(ENV_BASE_DELAY_MS, "soon")]);

    let result = ManagerConfig::default().apply_env_overrides();

    match result {
        Err(ConfigError::EnvOverride {
            variable, value, ..
        }) => {
            assert_eq!(variable, ENV_BASE_DELAY_MS);
            assert_eq!(value, "soon");
        }
        other => panic!("Expected EnvOverride, got {other:?}"),
    }
}

#[test]
#[serial]
fn given_env_override_breaking_invariant_when_applied_then_revalidated() {
    let _env = EnvGuard::set(&[(ENV_ENDPOINT, "http://registry.example.com")]);

    let result = ManagerConfig::default().apply_env_overrides();

    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}
