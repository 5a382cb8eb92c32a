//! Daily forecasts with a six-hour cache and a seeded mock fallback.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::AppConfig;
use crate::db::WeatherCacheRepository;
use crate::models::weather::{DailyForecast, ForecastSource, WeatherRecord};
use crate::services::fallback::{always_recoverable, with_fallback, Outcome};

const WEATHER_API_URL: &str = "https://api.weatherapi.com/v1/forecast.json";
pub const CACHE_TTL_HOURS: i64 = 6;
pub const MAX_FORECAST_DAYS: i64 = 14;
const MOCK_CONDITIONS: [&str; 6] = [
    "Sunny",
    "Partly cloudy",
    "Cloudy",
    "Light rain",
    "Patchy rain possible",
    "Clear",
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WeatherError {
    #[error("Weather API key is not configured")]
    NotConfigured,

    #[error("Weather request failed: {0}")]
    Request(String),

    #[error("Weather API returned status {0}")]
    Status(u16),

    #[error("No forecast returned for {0}")]
    Missing(String),
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch(&self, location: &str, date: NaiveDate) -> Result<DailyForecast, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    forecast: ForecastBody,
}

#[derive(Debug, Deserialize)]
struct ForecastBody {
    forecastday: Vec<ForecastDay>,
}

#[derive(Debug, Deserialize)]
struct ForecastDay {
    day: DaySummary,
}

#[derive(Debug, Deserialize)]
struct DaySummary {
    maxtemp_c: f64,
    mintemp_c: f64,
    maxwind_kph: f64,
    avghumidity: f64,
    daily_chance_of_rain: f64,
    condition: Condition,
}

#[derive(Debug, Deserialize)]
struct Condition {
    text: String,
}

pub struct WeatherApiClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
}

impl WeatherApiClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        if config.weather_api_key.is_none() {
            log::warn!("WEATHER_API_KEY not set, forecasts will be simulated");
        }
        Self::new(config.weather_api_key.clone())
    }
}

fn percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

#[async_trait]
impl WeatherProvider for WeatherApiClient {
    async fn fetch(&self, location: &str, date: NaiveDate) -> Result<DailyForecast, WeatherError> {
        let api_key = self.api_key.as_ref().ok_or(WeatherError::NotConfigured)?;
        let date_param = date.format("%Y-%m-%d").to_string();

        let response = self
            .http_client
            .get(WEATHER_API_URL)
            .query(&[
                ("key", api_key.as_str()),
                ("q", location),
                ("dt", date_param.as_str()),
            ])
            .send()
            .await
            .map_err(|e| WeatherError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(WeatherError::Status(response.status().as_u16()));
        }

        let body: ForecastResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Request(e.to_string()))?;

        let day = body
            .forecast
            .forecastday
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::Missing(location.to_string()))?
            .day;

        Ok(DailyForecast {
            temp_max: day.maxtemp_c,
            temp_min: day.mintemp_c,
            condition: day.condition.text,
            precipitation: percent(day.daily_chance_of_rain),
            humidity: percent(day.avghumidity),
            wind_speed: day.maxwind_kph,
        })
    }
}

pub fn normalize_location(location: &str) -> String {
    location.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Plausible forecast derived only from (location, date).
pub fn mock_forecast(location: &str, date: NaiveDate) -> DailyForecast {
    let digest = Sha256::digest(format!("{}|{}", normalize_location(location), date).as_bytes());
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    let mut rng = StdRng::seed_from_u64(u64::from_le_bytes(seed));

    let temp_max = round1(rng.gen_range(18.0..34.0));
    let temp_min = round1(temp_max - rng.gen_range(5.0..11.0));
    DailyForecast {
        temp_max,
        temp_min,
        condition: MOCK_CONDITIONS[rng.gen_range(0..MOCK_CONDITIONS.len())].to_string(),
        precipitation: rng.gen_range(0..=80),
        humidity: rng.gen_range(35..=90),
        wind_speed: round1(rng.gen_range(4.0..28.0)),
    }
}

pub struct WeatherService {
    provider: Arc<dyn WeatherProvider>,
    cache: Arc<dyn WeatherCacheRepository>,
}

impl WeatherService {
    pub fn new(provider: Arc<dyn WeatherProvider>, cache: Arc<dyn WeatherCacheRepository>) -> Self {
        Self { provider, cache }
    }

    pub async fn get_forecast(&self, location: &str, date: NaiveDate) -> WeatherRecord {
        self.get_forecast_at(location, date, Utc::now()).await
    }

    /// Never fails: anything other than a fresh cache hit or a live answer yields a mock record.
    pub async fn get_forecast_at(&self, location: &str, date: NaiveDate, now: DateTime<Utc>) -> WeatherRecord {
        let key = normalize_location(location);

        match self.cache.find_maybe(&key, date).await {
            Ok(Some(cached)) if now - cached.fetched_at < Duration::hours(CACHE_TTL_HOURS) => {
                return cached;
            }
            Ok(_) => {}
            Err(e) => log::warn!("Weather cache lookup failed: {}", e),
        }

        let mock = |key: &str| WeatherRecord {
            location: key.to_string(),
            date,
            forecast: mock_forecast(key, date),
            source: ForecastSource::Mock,
            fetched_at: now,
        };

        if (date - now.date_naive()).num_days() > MAX_FORECAST_DAYS {
            log::warn!("Forecast for {} on {} is too far out, using mock data", key, date);
            return mock(&key);
        }

        let result = with_fallback(
            "Weather lookup",
            self.provider.fetch(&key, date),
            || mock_forecast(&key, date),
            always_recoverable,
        )
        .await;

        let (forecast, outcome) = match result {
            Ok(value) => value,
            Err(_) => return mock(&key),
        };
        if outcome == Outcome::Fallback {
            return mock(&key);
        }

        let record = WeatherRecord {
            location: key,
            date,
            forecast,
            source: ForecastSource::Live,
            fetched_at: now,
        };
        if let Err(e) = self.cache.store(&record).await {
            log::warn!("Failed to cache forecast: {}", e);
        }
        record
    }
}
