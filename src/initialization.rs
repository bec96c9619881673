use std::env;
use log::{info, warn};
use thiserror::Error;
use crate::config::{load_config, Config, LoadConfigurationError};
use crate::logging::{setup_logger, LoggerError};
use crate::manager_forecast::{Forecast, ForecastError};
use crate::models::Position;
use crate::pipeline::Pipeline;
use crate::publish::{PublishError, Publisher};
use crate::worker::Worker;

/// Initializes and returns configuration and a worker wired to the forecast API
///
pub fn init() -> Result<(Config, Worker<Forecast>), InitializationError> {
    let args: Vec<String> = env::args().collect();
    let config_path = config_path(&args)?;

    // Load configuration
    let config = load_config(config_path)?;

    // Setup logging
    let _ = setup_logger(&config.general.log_path, config.general.log_level, config.general.log_to_stdout)?;

    // Print version
    info!("starting weather dashboard version: {}", env!("CARGO_PKG_VERSION"));

    // Environment variables already set take precedence over .env
    if let Err(e) = dotenvy::dotenv() {
        info!("no .env file loaded: {}", e);
    }
    let api_key = env::var("API_KEY").ok().filter(|k| !k.is_empty());
    if api_key.is_none() {
        warn!("API_KEY is not set, refresh cycles with a position will fail");
    }

    // Instantiate structs
    let forecast = Forecast::new(&config.forecast)?;
    let pipeline = Pipeline::new(forecast, api_key, &config.forecast.units, config.refresh.show_precipitation)
        .with_temperature_kind(config.refresh.temperature_kind);
    let publisher = Publisher::new(&config.files.output_dir, config.style.clone())?;
    let fallback = config.location.map(|g| Position::new(g.lat, g.lon));

    let worker = Worker::new(pipeline, publisher, fallback);

    Ok((config, worker))
}

/// Returns the path given by the `--config=` argument
///
/// # Arguments
///
/// * 'args' - command line arguments
fn config_path(args: &[String]) -> Result<&str, InitializationError> {
    args.iter()
        .find_map(|p| p.strip_prefix("--config="))
        .filter(|p| !p.is_empty())
        .ok_or_else(|| InitializationError::ArgumentError("missing --config=<path> argument".into()))
}

/// Error depicting errors that occur while initializing the dashboard
///
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("ArgumentError: {0}")]
    ArgumentError(String),
    #[error("ConfigurationError: {0}")]
    ConfigurationError(#[from] LoadConfigurationError),
    #[error("SetupLoggerError: {0}")]
    SetupLoggerError(#[from] LoggerError),
    #[error("ForecastSetupError: {0}")]
    ForecastSetupError(#[from] ForecastError),
    #[error("PublisherSetupError: {0}")]
    PublisherSetupError(#[from] PublishError),
}
