use registry_watch::error::AppError;
use registry_watch::logger::initialize as LoggerInitialize;
use registry_watch::paths::{detect_paths, load_dotenv};
use registry_watch::state::AppState;

use realtime_core::ManagerConfig;

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::panic::Location;
use std::process::ExitCode;

use log::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("registry-watch: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), AppError> {
    // .env may carry the config dir override, so it goes first
    let dotenv_path = load_dotenv();
    let paths = detect_paths()?;

    create_dir_all(&paths.log_dir).map_err(|e| AppError::App {
        message: format!("Failed to create log directory {}: {e}", paths.log_dir.display()),
        location: ErrorLocation::from(Location::caller()),
    })?;

    LoggerInitialize(&paths.log_dir)?;

    info!("Registry watch starting");
    info!("Paths from {}", paths.source);
    info!("Config directory: {}", paths.config_dir.display());
    info!("Log directory: {}", paths.log_dir.display());
    if let Some(path) = dotenv_path {
        info!("Loaded .env from: {}", path.display());
    }

    let config = ManagerConfig::load(&paths.config_dir)?.apply_env_overrides()?;
    let state = AppState::new(config);
    state.start()?;

    tokio::signal::ctrl_c().await.map_err(|e| AppError::App {
        message: format!("Failed to listen for shutdown signal: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    info!("Shutdown requested");
    state.stop();
    Ok(())
}
