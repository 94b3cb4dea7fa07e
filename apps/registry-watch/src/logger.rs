//! Logging for the registry watcher.
//!
//! Coloured stdout plus a plain `registry-watch.log` file. Initialization runs
//! once per process; later calls are harmless.

use crate::error::AppError;

use common::ErrorLocation;

use std::env;
use std::fmt::{Arguments, Display};
use std::io::stdout;
use std::panic::Location;
use std::path::Path;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use fern::{Dispatch, FormatCallback};
use humantime::format_rfc3339;
use log::{LevelFilter, Record, info, warn};

static INIT_LOGGER_ONCE: Once = Once::new();

static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

const LOG_FILE_NAME: &str = "registry-watch.log";

/// Overrides the default level, e.g. `REGISTRY_WATCH_LOG=trace`.
pub const LOG_LEVEL_ENV: &str = "REGISTRY_WATCH_LOG";

#[cfg(debug_assertions)]
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Handshake and frame chatter from the socket stack.
const QUIET_MODULES: [&str; 2] = ["tungstenite", "tokio_tungstenite"];

/// Initialize dual logging into `log_dir`.
///
/// Safe to call more than once: the first call installs the logger, later
/// calls log a warning and return `Ok`.
///
/// # Errors
///
/// Returns [`AppError::Logger`] if the log file cannot be created or a global
/// logger is already installed by someone else.
pub fn initialize(log_dir: &Path) -> Result<(), AppError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("Logger already initialized");
        return Ok(());
    }

    let level = level_from_env();
    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = initialize_internal(log_dir, level);
        if result.is_ok() {
            info!("Logger initialized with level: {level:?}");
        }
    });

    result
}

/// Level named by [`LOG_LEVEL_ENV`], or the build default.
pub fn level_from_env() -> LevelFilter {
    match env::var(LOG_LEVEL_ENV) {
        Ok(value) => value.trim().parse().unwrap_or(DEFAULT_LOG_LEVEL),
        Err(_) => DEFAULT_LOG_LEVEL,
    }
}

fn write_line(
    out: FormatCallback<'_>,
    message: &Arguments<'_>,
    record: &Record<'_>,
    level: &dyn Display,
) {
    out.finish(format_args!(
        "[{date} - {level}] {message} [{file}:{line}]",
        date = format_rfc3339(SystemTime::now()),
        file = record.file().unwrap_or("unknown"),
        line = record.line().unwrap_or(0),
    ))
}

#[track_caller]
fn initialize_internal(log_dir: &Path, level: LevelFilter) -> Result<(), AppError> {
    let log_file_path = log_dir.join(LOG_FILE_NAME);

    let colors = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    let mut base_dispatch = Dispatch::new().level(level);
    for module in QUIET_MODULES {
        base_dispatch = base_dispatch.level_for(module, LevelFilter::Warn);
    }

    let stdout_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            write_line(out, message, record, &colors.color(record.level()))
        })
        .chain(stdout());

    let log_file = fern::log_file(&log_file_path).map_err(|e| AppError::Logger {
        message: format!("Failed to create log file {}: {e}", log_file_path.display()),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let file_dispatch = Dispatch::new()
        .format(|out, message, record| write_line(out, message, record, &record.level()))
        .chain(log_file);

    base_dispatch
        .chain(stdout_dispatch)
        .chain(file_dispatch)
        .apply()
        .map_err(|e| AppError::Logger {
            message: format!("Failed to initialize logger: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

    Ok(())
}
