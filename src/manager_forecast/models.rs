use serde::Deserialize;

/// Parameters for one forecast request, built fresh for every refresh
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub api_key: String,
    pub latitude: f64,
    pub longitude: f64,
    pub units: String,
}

impl ForecastRequest {
    /// Returns the forecast endpoint for this request, units go in the query
    ///
    /// # Arguments
    ///
    /// * 'base_url' - scheme and host of the forecast API
    pub fn endpoint(&self, base_url: &str) -> String {
        format!("{}/forecast/{}/{},{}", base_url.trim_end_matches('/'), self.api_key, self.latitude, self.longitude)
    }
}

#[derive(Deserialize, Debug)]
pub struct HourlyDataPoint {
    pub time: i64,
    pub temperature: f64,
    #[serde(rename = "precipIntensity")]
    pub precip_intensity: f64,
}

#[derive(Deserialize, Debug)]
pub struct HourlyBlock {
    pub data: Vec<HourlyDataPoint>,
}

#[derive(Deserialize, Debug)]
pub struct ForecastDocument {
    pub hourly: HourlyBlock,
}
