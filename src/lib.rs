pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::Repositories;
use crate::services::export::document::ImageFetcher;
use crate::services::image_service::{ActivityImageService, ImageSearch};
use crate::services::itinerary_generation_service::ItineraryGenerator;
use crate::services::llm_service::CompletionProvider;
use crate::services::package_service::PackageGenerator;
use crate::services::recommendation_service::RecommendationService;
use crate::services::weather_service::{WeatherProvider, WeatherService};

/// Shared per-process state handed to every handler through `web::Data`.
pub struct AppState {
    pub config: AppConfig,
    pub repos: Repositories,
    pub llm: Arc<dyn CompletionProvider>,
    pub image_search: Arc<dyn ImageSearch>,
    pub weather: Arc<dyn WeatherProvider>,
    pub image_fetcher: Arc<dyn ImageFetcher>,
}

impl AppState {
    pub fn itinerary_generator(&self) -> ItineraryGenerator {
        ItineraryGenerator::new(self.llm.clone(), self.config.generation_timeout)
    }

    pub fn package_generator(&self) -> PackageGenerator {
        PackageGenerator::new(self.llm.clone())
    }

    pub fn recommendations(&self) -> RecommendationService {
        RecommendationService::new(self.llm.clone(), self.image_search.clone())
    }

    pub fn activity_images(&self) -> ActivityImageService {
        ActivityImageService::new(self.image_search.clone(), self.repos.activity_images.clone())
    }

    pub fn weather_service(&self) -> WeatherService {
        WeatherService::new(self.weather.clone(), self.repos.weather_cache.clone())
    }
}
