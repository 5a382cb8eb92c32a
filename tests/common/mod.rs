#![allow(dead_code)]

use std::sync::Arc;

use actix_web::{web, App};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};

use itinera_api::config::AppConfig;
use itinera_api::db::memory::{MemoryGuestItineraryRepository, MemoryItineraryRepository};
use itinera_api::db::Repositories;
use itinera_api::middleware::auth::encode_token;
use itinera_api::models::destination::DestinationPhoto;
use itinera_api::models::weather::DailyForecast;
use itinera_api::routes;
use itinera_api::services::export::document::ImageFetcher;
use itinera_api::services::export::ExportError;
use itinera_api::services::image_service::{ImageError, ImageSearch};
use itinera_api::services::llm_service::{CompletionProvider, CompletionRequest, LlmError, OpenAiClient};
use itinera_api::services::weather_service::{WeatherError, WeatherProvider};
use itinera_api::AppState;

pub const JWT_SECRET: &str = "integration_test_secret";
pub const GUEST_SESSION: &str = "guest_1767225600000_abc123xyz";

/// Image search that is never configured.
pub struct NoImages;

#[async_trait]
impl ImageSearch for NoImages {
    async fn search(&self, _query: &str, _count: usize) -> Result<Vec<DestinationPhoto>, ImageError> {
        Err(ImageError::NotConfigured)
    }
}

pub struct NoWeather;

#[async_trait]
impl WeatherProvider for NoWeather {
    async fn fetch(&self, _location: &str, _date: NaiveDate) -> Result<DailyForecast, WeatherError> {
        Err(WeatherError::NotConfigured)
    }
}

pub struct OfflineFetcher;

#[async_trait]
impl ImageFetcher for OfflineFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ExportError> {
        Err(ExportError::Image(format!("offline: {}", url)))
    }
}

/// Answers every completion with the same canned reply.
pub struct CannedLlm(pub Result<String, LlmError>);

#[async_trait]
impl CompletionProvider for CannedLlm {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, LlmError> {
        self.0.clone()
    }
}

pub struct TestApp {
    pub state: web::Data<AppState>,
    pub itineraries: Arc<MemoryItineraryRepository>,
    pub guest_itineraries: Arc<MemoryGuestItineraryRepository>,
}

impl TestApp {
    /// In-memory stores with no LLM key configured, so every pipeline falls back.
    pub fn new() -> Self {
        Self::with_llm(Arc::new(OpenAiClient::new(None, "http://localhost:1", "test-model")))
    }

    pub fn with_llm(llm: Arc<dyn CompletionProvider>) -> Self {
        let itineraries = Arc::new(MemoryItineraryRepository::default());
        let guest_itineraries = Arc::new(MemoryGuestItineraryRepository::default());

        let mut repos = Repositories::in_memory();
        repos.itineraries = itineraries.clone();
        repos.guest_itineraries = guest_itineraries.clone();

        let config = AppConfig {
            jwt_secret: JWT_SECRET.to_string(),
            ..AppConfig::default()
        };

        let state = web::Data::new(AppState {
            config,
            repos,
            llm,
            image_search: Arc::new(NoImages),
            weather: Arc::new(NoWeather),
            image_fetcher: Arc::new(OfflineFetcher),
        });

        Self {
            state,
            itineraries,
            guest_itineraries,
        }
    }

    pub fn create_app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(self.state.clone())
            .configure(|cfg| routes::configure(cfg, JWT_SECRET))
    }
}

pub fn bearer(user_id: &str) -> (&'static str, String) {
    let token = encode_token(user_id, &format!("{}@example.com", user_id), JWT_SECRET, Duration::hours(1))
        .unwrap();
    ("Authorization", format!("Bearer {}", token))
}

pub fn guest_header() -> (&'static str, &'static str) {
    ("X-Guest-Session", GUEST_SESSION)
}
