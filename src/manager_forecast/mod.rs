pub mod models;

use std::time::Duration;
use log::debug;
use reqwest::blocking::Client;
use thiserror::Error;
use crate::config;
use crate::models::{unix_to_hours, HourlyRecord};
use crate::manager_forecast::models::{ForecastDocument, ForecastRequest};

/// Anything that can deliver hourly forecast records for a request
pub trait ForecastSource {
    fn hourly(&self, request: &ForecastRequest) -> Result<Vec<HourlyRecord>, ForecastError>;
}

/// Struct for fetching hourly forecasts from the Pirate Weather API
pub struct Forecast {
    client: Client,
    base_url: String,
}

impl Forecast {
    /// Returns a forecast struct ready for fetching hourly forecasts
    ///
    /// # Arguments
    ///
    /// * 'config' - forecast configuration to use
    pub fn new(config: &config::Forecast) -> Result<Forecast, ForecastError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Forecast {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

impl ForecastSource for Forecast {
    /// Retrieves the hourly forecast for the request's coordinates
    ///
    /// # Arguments
    ///
    /// * 'request' - api key, coordinates and units to request
    fn hourly(&self, request: &ForecastRequest) -> Result<Vec<HourlyRecord>, ForecastError> {
        debug!("Requesting forecast for {},{} units {}", request.latitude, request.longitude, request.units);

        let response = self.client
            .get(request.endpoint(&self.base_url))
            .query(&[("units", request.units.as_str())])
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(ForecastError::HttpStatus(status.as_u16(), body));
        }

        parse_hourly(&body)
    }
}

/// Parses a forecast document and derives the UTC datetime of every hourly record
///
/// # Arguments
///
/// * 'json' - the forecast document as returned by the API
pub fn parse_hourly(json: &str) -> Result<Vec<HourlyRecord>, ForecastError> {
    let document: ForecastDocument = serde_json::from_str(json)
        .map_err(|e| ForecastError::Payload(e.to_string()))?;

    document.hourly.data
        .into_iter()
        .map(|d| {
            let datetime = unix_to_hours(d.time)
                .map_err(|e| ForecastError::Payload(e.to_string()))?;
            Ok(HourlyRecord {
                time: d.time,
                temperature: d.temperature,
                precip_intensity: d.precip_intensity,
                datetime,
            })
        })
        .collect()
}

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("NetworkError: {0}")]
    Network(reqwest::Error),
    #[error("HttpStatusError: {0}: {1}")]
    HttpStatus(u16, String),
    #[error("PayloadError: {0}")]
    Payload(String),
}

/// Drops the request url from transport errors, its path carries the api key
///
impl From<reqwest::Error> for ForecastError {
    fn from(e: reqwest::Error) -> Self {
        ForecastError::Network(e.without_url())
    }
}

impl ForecastError {
    /// Whether a new attempt could reasonably succeed
    ///
    pub fn is_transient(&self) -> bool {
        match self {
            ForecastError::Network(_) => true,
            ForecastError::HttpStatus(status, _) => *status >= 500 || *status == 429,
            ForecastError::Payload(_) => false,
        }
    }
}
