use std::fs;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::chart::ChartKind;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct GeoRef {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Deserialize, Debug)]
pub struct Forecast {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_units")]
    pub units: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Deserialize, Debug)]
pub struct Refresh {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_true")]
    pub show_precipitation: bool,
    #[serde(default)]
    pub temperature_kind: ChartKind,
    /// File to read geolocation updates from, one JSON position per line. Stdin if not set.
    pub geolocation_feed: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Style {
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_text")]
    pub text: String,
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default = "default_border_radius")]
    pub border_radius: String,
    #[serde(default = "default_padding")]
    pub padding: String,
    #[serde(default = "default_template")]
    pub template: String,
}

#[derive(Deserialize, Debug)]
pub struct Files {
    pub output_dir: String,
}

#[derive(Deserialize, Debug)]
pub struct General {
    pub log_path: String,
    pub log_level: LevelFilter,
    pub log_to_stdout: bool,
}

#[derive(Deserialize, Debug)]
pub struct Config {
    pub general: General,
    pub forecast: Forecast,
    pub refresh: Refresh,
    pub location: Option<GeoRef>,
    #[serde(default = "Style::defaults")]
    pub style: Style,
    pub files: Files,
}

impl Style {
    /// Returns the dashboard default look: blue background, light cyan text
    ///
    pub fn defaults() -> Style {
        Style {
            background: default_background(),
            text: default_text(),
            font: default_font(),
            border_radius: default_border_radius(),
            padding: default_padding(),
            template: default_template(),
        }
    }
}

fn default_base_url() -> String { "https://api.pirateweather.net".into() }
fn default_units() -> String { "ca".into() }
fn default_timeout_secs() -> u64 { 30 }
fn default_interval_secs() -> u64 { 10 * 60 }
fn default_true() -> bool { true }
fn default_background() -> String { "rgba(0,100,200,1)".into() }
fn default_text() -> String { "#7FDBFF".into() }
fn default_font() -> String { "sans-serif".into() }
fn default_border_radius() -> String { "25px".into() }
fn default_padding() -> String { "5px".into() }
fn default_template() -> String { "plotly_white".into() }

/// Loads the configuration file and returns a struct with all configuration items
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
pub fn load_config(config_path: &str) -> Result<Config, LoadConfigurationError> {
    let toml = fs::read_to_string(config_path)
        .map_err(|e| LoadConfigurationError(format!("reading {}: {}", config_path, e)))?;

    parse_config(&toml)
}

/// Parses configuration from a TOML string
///
/// # Arguments
///
/// * 'toml' - the configuration document
pub fn parse_config(toml: &str) -> Result<Config, LoadConfigurationError> {
    let config: Config = toml::from_str(toml)
        .map_err(|e| LoadConfigurationError(e.to_string()))?;

    if config.refresh.interval_secs == 0 {
        return Err(LoadConfigurationError("refresh.interval_secs must be greater than zero".into()));
    }

    Ok(config)
}

/// Error depicting errors that occur while loading the configuration
///
#[derive(Debug, Error)]
#[error("LoadConfigurationError: {0}")]
pub struct LoadConfigurationError(pub String);
