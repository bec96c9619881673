use std::time::Duration;
use log::{debug, info, warn};
use thiserror::Error;
use crate::chart::{ChartKind, ChartSpec};
use crate::manager_forecast::{ForecastError, ForecastSource};
use crate::manager_forecast::models::ForecastRequest;
use crate::models::{HourlyTable, Position};
use crate::retry;

/// What started a refresh cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    /// Periodic timer tick carrying the number of intervals elapsed
    Tick(u64),
    /// A new position from the geolocation source
    Geolocation(Position),
}

/// A single pipeline output, either left as is or replaced
#[derive(Debug, Clone, PartialEq)]
pub enum Update<T> {
    NoUpdate,
    Set(T),
}

impl<T> Update<T> {
    pub fn is_update(&self) -> bool {
        matches!(self, Update::Set(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshOutput {
    pub temperature: Update<ChartSpec>,
    pub precipitation: Update<ChartSpec>,
    /// Request for the geolocation source to report now
    pub geolocation_update: Update<bool>,
}

impl RefreshOutput {
    pub fn no_update() -> RefreshOutput {
        RefreshOutput {
            temperature: Update::NoUpdate,
            precipitation: Update::NoUpdate,
            geolocation_update: Update::NoUpdate,
        }
    }
}

/// Struct for turning triggers into chart updates
pub struct Pipeline<S: ForecastSource> {
    source: S,
    api_key: Option<String>,
    units: String,
    show_precipitation: bool,
    temperature_kind: ChartKind,
    retry_wait: Duration,
}

impl<S: ForecastSource> Pipeline<S> {
    /// Returns a pipeline ready for refreshing
    ///
    /// # Arguments
    ///
    /// * 'source' - where hourly forecasts are fetched from
    /// * 'api_key' - forecast API key, a refresh that needs it fails if missing
    /// * 'units' - unit system to request
    /// * 'show_precipitation' - whether to produce the precipitation chart
    pub fn new(source: S, api_key: Option<String>, units: &str, show_precipitation: bool) -> Pipeline<S> {
        Pipeline {
            source,
            api_key,
            units: units.to_string(),
            show_precipitation,
            temperature_kind: ChartKind::Scatter,
            retry_wait: Duration::from_secs(5),
        }
    }

    pub fn with_temperature_kind(mut self, temperature_kind: ChartKind) -> Pipeline<S> {
        self.temperature_kind = temperature_kind;
        self
    }

    /// Sets the initial wait between retries of transient failures
    ///
    pub fn with_retry_wait(mut self, retry_wait: Duration) -> Pipeline<S> {
        self.retry_wait = retry_wait;
        self
    }

    /// Runs one refresh cycle.
    /// Without complete coordinates nothing is fetched and every output is left as is.
    ///
    /// # Arguments
    ///
    /// * 'trigger' - what started the cycle
    /// * 'position' - the current position, if known
    pub fn refresh(&self, trigger: &Trigger, position: Option<&Position>) -> Result<RefreshOutput, RefreshError> {
        let Some((latitude, longitude)) = position.and_then(|p| p.coordinates()) else {
            debug!("No complete position for {:?}, skipping refresh", trigger);
            return Ok(RefreshOutput::no_update());
        };

        let api_key = self.api_key.as_ref().ok_or(RefreshError::MissingApiKey)?;
        let request = ForecastRequest {
            api_key: api_key.clone(),
            latitude,
            longitude,
            units: self.units.clone(),
        };

        let records = retry!(self.retry_wait, || self.source.hourly(&request))?;
        let table = HourlyTable::new(records);
        if table.is_empty() {
            warn!("Forecast for {},{} has no hourly records", latitude, longitude);
        }
        info!("Refreshed {} hourly records for {},{} on {:?}", table.len(), latitude, longitude, trigger);

        let precipitation = if self.show_precipitation {
            Update::Set(ChartSpec::precipitation(&table))
        } else {
            Update::NoUpdate
        };

        Ok(RefreshOutput {
            temperature: Update::Set(ChartSpec::temperature(&table, self.temperature_kind)),
            precipitation,
            geolocation_update: Update::NoUpdate,
        })
    }
}

/// Error depicting errors that occur during a refresh cycle
///
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("MissingApiKeyError: API_KEY is not set")]
    MissingApiKey,
    #[error("ForecastError: {0}")]
    Forecast(#[from] ForecastError),
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use chrono::{TimeZone, Utc};
    use crate::manager_forecast::parse_hourly;
    use crate::models::HourlyRecord;

    /// Forecast source answering from a canned document and counting calls
    pub(crate) struct StubSource {
        pub responses: RefCell<Vec<Result<String, u16>>>,
        pub calls: Cell<usize>,
        pub requests: RefCell<Vec<ForecastRequest>>,
    }

    impl StubSource {
        pub(crate) fn new(responses: Vec<Result<String, u16>>) -> StubSource {
            StubSource { responses: RefCell::new(responses), calls: Cell::new(0), requests: RefCell::new(Vec::new()) }
        }

        pub(crate) fn ok(json: &str) -> StubSource {
            StubSource::new(vec![Ok(json.to_string())])
        }
    }

    impl ForecastSource for StubSource {
        fn hourly(&self, request: &ForecastRequest) -> Result<Vec<HourlyRecord>, ForecastError> {
            self.calls.set(self.calls.get() + 1);
            self.requests.borrow_mut().push(request.clone());
            let mut responses = self.responses.borrow_mut();
            // The last response repeats once the queue is down to one
            let response = if responses.len() > 1 { responses.remove(0) } else { responses[0].clone() };
            match response {
                Ok(json) => parse_hourly(&json),
                Err(status) => Err(ForecastError::HttpStatus(status, String::new())),
            }
        }
    }

    impl<S: ForecastSource> Pipeline<S> {
        pub(crate) fn source(&self) -> &S {
            &self.source
        }
    }

    pub(crate) const ONE_HOUR: &str = r#"{"hourly": {"data": [{"time": 1700000000, "temperature": 5.0, "precipIntensity": 0.1}]}}"#;

    fn pipeline(source: StubSource) -> Pipeline<StubSource> {
        Pipeline::new(source, Some("key".into()), "ca", true).with_retry_wait(Duration::ZERO)
    }

    #[test]
    fn test_no_position_no_update() {
        let p = pipeline(StubSource::ok(ONE_HOUR));

        let out = p.refresh(&Trigger::Tick(0), None).unwrap();
        assert_eq!(out, RefreshOutput::no_update());
        assert_eq!(p.source().calls.get(), 0);

        // Same tick again is still a no-op
        let out = p.refresh(&Trigger::Tick(0), None).unwrap();
        assert_eq!(out, RefreshOutput::no_update());
        assert_eq!(p.source().calls.get(), 0);
    }

    #[test]
    fn test_partial_position_no_update() {
        let p = pipeline(StubSource::ok(ONE_HOUR));

        for position in [Position { lat: Some(52.52), lon: None }, Position { lat: None, lon: Some(13.40) }, Position::default()] {
            let out = p.refresh(&Trigger::Geolocation(position), Some(&position)).unwrap();
            assert!(!out.temperature.is_update());
            assert!(!out.precipitation.is_update());
            assert!(!out.geolocation_update.is_update());
        }
        assert_eq!(p.source().calls.get(), 0);
    }

    #[test]
    fn test_end_to_end_one_record() {
        let p = pipeline(StubSource::ok(ONE_HOUR));
        let position = Position::new(52.52, 13.40);

        let out = p.refresh(&Trigger::Geolocation(position), Some(&position)).unwrap();

        let Update::Set(temperature) = out.temperature else { panic!("temperature not updated") };
        assert_eq!(temperature.x, vec![Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap()]);
        assert_eq!(temperature.y, vec![5.0]);
        assert_eq!(temperature.kind, ChartKind::Scatter);

        let Update::Set(precipitation) = out.precipitation else { panic!("precipitation not updated") };
        assert_eq!(precipitation.y, vec![0.1]);
        assert_eq!(out.geolocation_update, Update::NoUpdate);

        let requests = p.source().requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0], ForecastRequest { api_key: "key".into(), latitude: 52.52, longitude: 13.40, units: "ca".into() });
    }

    #[test]
    fn test_axis_sorted_for_unordered_response() {
        let json = r#"{"hourly": {"data": [
            {"time": 1700007200, "temperature": 3.0, "precipIntensity": 0.0},
            {"time": 1700000000, "temperature": 1.0, "precipIntensity": 0.0},
            {"time": 1700003600, "temperature": 2.0, "precipIntensity": 0.0}
        ]}}"#;
        let p = pipeline(StubSource::ok(json));
        let position = Position::new(1.0, 2.0);

        let out = p.refresh(&Trigger::Tick(3), Some(&position)).unwrap();

        let Update::Set(temperature) = out.temperature else { panic!("temperature not updated") };
        assert_eq!(temperature.x.len(), 3);
        assert!(temperature.x.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(temperature.y, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_precipitation_disabled() {
        let p = Pipeline::new(StubSource::ok(ONE_HOUR), Some("key".into()), "si", false);
        let position = Position::new(1.0, 2.0);

        let out = p.refresh(&Trigger::Tick(1), Some(&position)).unwrap();
        assert!(out.temperature.is_update());
        assert_eq!(out.precipitation, Update::NoUpdate);
    }

    #[test]
    fn test_line_temperature_chart() {
        let p = pipeline(StubSource::ok(ONE_HOUR)).with_temperature_kind(ChartKind::Line);
        let position = Position::new(1.0, 2.0);

        let out = p.refresh(&Trigger::Tick(1), Some(&position)).unwrap();
        let Update::Set(temperature) = out.temperature else { panic!("temperature not updated") };
        assert_eq!(temperature.kind, ChartKind::Line);
    }

    #[test]
    fn test_empty_forecast_gives_empty_charts() {
        let p = pipeline(StubSource::ok(r#"{"hourly": {"data": []}}"#));
        let position = Position::new(1.0, 2.0);

        let out = p.refresh(&Trigger::Tick(1), Some(&position)).unwrap();
        let Update::Set(temperature) = out.temperature else { panic!("temperature not updated") };
        assert!(temperature.x.is_empty());
    }

    #[test]
    fn test_missing_api_key() {
        let p = Pipeline::new(StubSource::ok(ONE_HOUR), None, "ca", true);
        let position = Position::new(1.0, 2.0);

        let err = p.refresh(&Trigger::Tick(1), Some(&position)).unwrap_err();
        assert!(matches!(err, RefreshError::MissingApiKey));
        assert_eq!(p.source().calls.get(), 0);
    }

    #[test]
    fn test_transient_failure_retried() {
        let p = pipeline(StubSource::new(vec![Err(503), Ok(ONE_HOUR.to_string())]));
        let position = Position::new(1.0, 2.0);

        let out = p.refresh(&Trigger::Tick(1), Some(&position)).unwrap();
        assert!(out.temperature.is_update());
        assert_eq!(p.source().calls.get(), 2);
    }

    #[test]
    fn test_http_status_surfaces() {
        let p = pipeline(StubSource::new(vec![Err(401)]));
        let position = Position::new(1.0, 2.0);

        let err = p.refresh(&Trigger::Tick(1), Some(&position)).unwrap_err();
        assert!(matches!(err, RefreshError::Forecast(ForecastError::HttpStatus(401, _))));
        assert_eq!(p.source().calls.get(), 1);
    }

    #[test]
    fn test_malformed_payload_surfaces() {
        let p = pipeline(StubSource::ok("{\"hourly\": {}}"));
        let position = Position::new(1.0, 2.0);

        let err = p.refresh(&Trigger::Tick(1), Some(&position)).unwrap_err();
        assert!(matches!(err, RefreshError::Forecast(ForecastError::Payload(_))));
    }
}
