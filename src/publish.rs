use std::fs;
use std::path::{Path, PathBuf};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use glob::glob;
use log::info;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use crate::chart::ChartSpec;
use crate::config::Style;
use crate::models::Position;

const DASHBOARD_TITLE: &str = "Realtime Weather Data Dashboard";
const DASHBOARD_FILE: &str = "dashboard.json";

/// What the dashboard currently shows
#[derive(Debug, Default, Clone)]
pub struct Dashboard {
    pub temperature: Option<ChartSpec>,
    pub precipitation: Option<ChartSpec>,
    pub position: Option<Position>,
    pub updated_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

#[derive(Serialize)]
struct Charts {
    temperature: Option<Value>,
    precipitation: Option<Value>,
}

#[derive(Serialize)]
struct DashboardDocument<'a> {
    title: &'a str,
    style: &'a Style,
    updated_at: Option<DateTime<Utc>>,
    position: Option<Position>,
    error: Option<&'a str>,
    charts: Charts,
}

/// Writes the dashboard for a UI to render
pub struct Publisher {
    output_dir: PathBuf,
    style: Style,
}

impl Publisher {
    /// Returns a publisher writing into the given directory, which is created if missing
    ///
    /// # Arguments
    ///
    /// * 'output_dir' - directory for the dashboard document and chart snapshots
    /// * 'style' - dashboard style handed on to the UI
    pub fn new(output_dir: &str, style: Style) -> Result<Publisher, PublishError> {
        fs::create_dir_all(output_dir)
            .map_err(|e| PublishError(format!("error creating output dir {}: {}", output_dir, e)))?;

        Ok(Publisher { output_dir: PathBuf::from(output_dir), style })
    }

    /// Writes the dashboard document and, if the dashboard has charts, a timestamped snapshot
    ///
    /// # Arguments
    ///
    /// * 'dashboard' - the dashboard to publish
    pub fn publish(&self, dashboard: &Dashboard) -> Result<PathBuf, PublishError> {
        let document = DashboardDocument {
            title: DASHBOARD_TITLE,
            style: &self.style,
            updated_at: dashboard.updated_at,
            position: dashboard.position,
            error: dashboard.error.as_deref(),
            charts: Charts {
                temperature: dashboard.temperature.as_ref().map(|c| c.to_figure(&self.style)),
                precipitation: dashboard.precipitation.as_ref().map(|c| c.to_figure(&self.style)),
            },
        };

        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| PublishError(format!("error serializing dashboard: {}", e)))?;

        let filename = self.output_dir.join(DASHBOARD_FILE);
        write_atomic(&filename, &json)?;
        info!("Dashboard saved to {}", filename.display());

        if let Some(updated_at) = dashboard.updated_at {
            self.save_snapshot(updated_at, dashboard)?;
        }

        Ok(filename)
    }

    /// Saves the raw chart specs under the refresh time and removes snapshots older than 48 hours
    ///
    /// # Arguments
    ///
    /// * 'updated_at' - time of the refresh that produced the charts
    /// * 'dashboard' - the dashboard holding the charts
    fn save_snapshot(&self, updated_at: DateTime<Utc>, dashboard: &Dashboard) -> Result<(), PublishError> {
        let filename = self.output_dir.join(format!("{}_charts.json", updated_at.format("%Y%m%d%H%M")));
        let charts = [&dashboard.temperature, &dashboard.precipitation];

        let json = serde_json::to_string_pretty(&charts)
            .map_err(|e| PublishError(format!("error serializing charts: {}", e)))?;
        fs::write(&filename, json)
            .map_err(|e| PublishError(format!("error writing {}: {}", filename.display(), e)))?;

        clean_up_files(&format!("{}/*_charts.json", self.output_dir.display()), updated_at)
    }
}

/// Writes to a temporary file first so readers never see a partial document
///
fn write_atomic(path: &Path, contents: &str) -> Result<(), PublishError> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)
        .map_err(|e| PublishError(format!("error writing {}: {}", tmp.display(), e)))?;
    fs::rename(&tmp, path)
        .map_err(|e| PublishError(format!("error renaming {}: {}", tmp.display(), e)))
}

/// Removes any files following the pattern that are older than 48 hours
///
/// # Arguments
///
/// * 'pattern' - file pattern
/// * 'gate_date_time' - the date time representing a newly created file
fn clean_up_files(pattern: &str, gate_date_time: DateTime<Utc>) -> Result<(), PublishError> {
    let entries = glob(pattern)
        .map_err(|e| PublishError(format!("error reading files with pattern {}: {}", pattern, e)))?;

    for path in entries.flatten() {
        let Some(filename) = path.file_name().and_then(|f| f.to_str()) else { continue };
        let Some(stamp) = filename.get(0..12) else { continue };
        let Ok(datetime) = NaiveDateTime::parse_from_str(stamp, "%Y%m%d%H%M") else { continue };

        if gate_date_time - datetime.and_utc() > Duration::hours(48) {
            fs::remove_file(&path)
                .map_err(|e| PublishError(format!("error removing file {}: {}", path.display(), e)))?;
        }
    }

    Ok(())
}

/// Error depicting errors that occur while publishing the dashboard
///
#[derive(Debug, Error)]
#[error("PublishError: {0}")]
pub struct PublishError(pub String);
