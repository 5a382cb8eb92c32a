use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastSource {
    Live,
    Mock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecast {
    pub temp_max: f64,
    pub temp_min: f64,
    pub condition: String,
    pub precipitation: u8,
    pub humidity: u8,
    pub wind_speed: f64,
}

/// A forecast row as cached, keyed by (location, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRecord {
    pub location: String,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub forecast: DailyForecast,
    pub source: ForecastSource,
    pub fetched_at: DateTime<Utc>,
}
