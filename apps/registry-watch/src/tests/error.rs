// Unit tests for AppError conversions and messages

use crate::error::AppError;

use realtime_core::ManagerConfig;
use realtime_core::RealtimeManager;

use common::ErrorLocation;

use std::panic::Location;

#[test]
fn given_app_error_when_displayed_then_includes_message_and_location() {
    let location = ErrorLocation::from(Location::caller());
    let err = AppError::Paths {
        message: String::from("No platform config directory"),
        location,
    };

    let text = err.to_string();

    assert!(text.starts_with("Paths Error: No platform config directory"));
    assert!(text.ends_with(&location.to_string()));
}

/// **VALUE**: Verifies core errors convert into `AppError` with `?`.
///
/// **WHY THIS MATTERS**: `main` relies on `?` across crate boundaries; a missing
/// `From` impl would force stringly error handling.
///
/// **BUG THIS CATCHES**: Would catch a removed `#[from]` on the Config or Realtime
/// variants.
#[test]
fn given_core_errors_when_converted_then_wrapped_in_matching_variant() {
    // GIVEN: A config error and a manager error
    let invalid = ManagerConfig {
        endpoint: String::from("http://registry.example.com"),
        ..ManagerConfig::default()
    };
    let config_error = invalid.validate().unwrap_err();
    let manager_error = RealtimeManager::new(ManagerConfig::default()).err().unwrap();

    // WHEN: Converting
    let from_config: AppError = config_error.into();
    let from_manager: AppError = manager_error.into();

    // THEN: Each lands in its own variant
    assert!(matches!(from_config, AppError::Config { .. }));
    assert!(matches!(from_manager, AppError::Realtime { .. }));
    assert!(from_manager.to_string().contains("tokio runtime"));
}
