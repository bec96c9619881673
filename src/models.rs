use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A position as delivered by a geolocation source. Either coordinate may be missing.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl Position {
    pub fn new(lat: f64, lon: f64) -> Position {
        Position { lat: Some(lat), lon: Some(lon) }
    }

    /// Returns the coordinates if both latitude and longitude are present
    ///
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct HourlyRecord {
    pub time: i64,
    pub temperature: f64,
    pub precip_intensity: f64,
    pub datetime: DateTime<Utc>,
}

/// Hourly forecast records ordered by ascending datetime
#[derive(Debug, Default)]
pub struct HourlyTable {
    pub records: Vec<HourlyRecord>,
}

impl HourlyTable {
    /// Creates a table from records in API response order.
    /// Records are stably sorted on datetime, so equal timestamps keep their response order.
    ///
    /// # Arguments
    ///
    /// * 'records' - hourly records as returned by the forecast source
    pub fn new(mut records: Vec<HourlyRecord>) -> HourlyTable {
        records.sort_by_key(|r| r.datetime);
        HourlyTable { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the datetime axis of the table
    ///
    pub fn datetimes(&self) -> Vec<DateTime<Utc>> {
        self.records.iter().map(|r| r.datetime).collect()
    }

    /// Returns one column of the table
    ///
    /// # Arguments
    ///
    /// * 'y_fn' - function that picks out whatever attribute to use from the record
    pub fn column(&self, y_fn: fn(&HourlyRecord) -> f64) -> Vec<f64> {
        self.records.iter().map(y_fn).collect()
    }
}

/// Converts a unix timestamp (seconds) to a UTC datetime
///
/// # Arguments
///
/// * 'unix_timestamp' - seconds since the unix epoch
pub fn unix_to_hours(unix_timestamp: i64) -> Result<DateTime<Utc>, TimestampError> {
    DateTime::from_timestamp(unix_timestamp, 0).ok_or(TimestampError(unix_timestamp))
}

#[derive(Debug, Error, PartialEq)]
#[error("timestamp out of range: {0}")]
pub struct TimestampError(pub i64);
