//! Persistence capabilities.
//!
//! Every collection the service touches sits behind a repository trait so the
//! pipelines only see keyed CRUD filtered by owner. `mongo` talks to MongoDB,
//! `memory` keeps everything in process for tests and local runs.

pub mod memory;
pub mod mongo;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::itinerary::{Day, Itinerary, NewItinerary};
use crate::models::profile::TravelerProfile;
use crate::models::weather::WeatherRecord;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for StoreError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Itineraries owned by authenticated users.
#[async_trait]
pub trait ItineraryRepository: Send + Sync {
    async fn insert(&self, user_id: &str, itinerary: NewItinerary) -> Result<Itinerary, StoreError>;

    async fn insert_many(
        &self,
        user_id: &str,
        itineraries: Vec<NewItinerary>,
    ) -> Result<Vec<Itinerary>, StoreError>;

    /// Zero-or-one read.
    async fn find_maybe(&self, id: &str) -> Result<Option<Itinerary>, StoreError>;

    /// Exactly-one read; a missing row is an error.
    async fn find_single(&self, id: &str) -> Result<Itinerary, StoreError> {
        self.find_maybe(id)
            .await?
            .ok_or_else(|| StoreError::NotFound("Itinerary not found".to_string()))
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Itinerary>, StoreError>;

    /// Returns which of `source_ids` already have a migrated copy owned by `user_id`.
    async fn migrated_sources(
        &self,
        user_id: &str,
        source_ids: &[String],
    ) -> Result<Vec<String>, StoreError>;

    async fn update_days(&self, id: &str, days: &[Day]) -> Result<(), StoreError>;

    /// Deletes only when `user_id` owns the row. Returns whether a row was removed.
    async fn delete_owned(&self, id: &str, user_id: &str) -> Result<bool, StoreError>;
}

/// Itineraries created by anonymous sessions.
#[async_trait]
pub trait GuestItineraryRepository: Send + Sync {
    async fn insert(&self, session_id: &str, itinerary: NewItinerary) -> Result<Itinerary, StoreError>;

    async fn list_for_session(&self, session_id: &str) -> Result<Vec<Itinerary>, StoreError>;

    async fn find_maybe(&self, session_id: &str, id: &str) -> Result<Option<Itinerary>, StoreError>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find_maybe(&self, user_id: &str) -> Result<Option<TravelerProfile>, StoreError>;

    async fn upsert(&self, profile: &TravelerProfile) -> Result<(), StoreError>;
}

/// Image URLs cached per activity hash.
#[async_trait]
pub trait ActivityImageRepository: Send + Sync {
    async fn find_maybe(&self, activity_hash: &str) -> Result<Option<Vec<String>>, StoreError>;

    async fn store(&self, activity_hash: &str, urls: &[String]) -> Result<(), StoreError>;
}

#[async_trait]
pub trait WeatherCacheRepository: Send + Sync {
    async fn find_maybe(
        &self,
        location: &str,
        date: NaiveDate,
    ) -> Result<Option<WeatherRecord>, StoreError>;

    async fn store(&self, record: &WeatherRecord) -> Result<(), StoreError>;
}

#[async_trait]
pub trait VisitCounterRepository: Send + Sync {
    async fn increment(&self) -> Result<i64, StoreError>;

    async fn current(&self) -> Result<i64, StoreError>;
}

/// Liveness of the backing database.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;
}

/// The full set of stores handed to routes and pipelines.
#[derive(Clone)]
pub struct Repositories {
    pub itineraries: Arc<dyn ItineraryRepository>,
    pub guest_itineraries: Arc<dyn GuestItineraryRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub activity_images: Arc<dyn ActivityImageRepository>,
    pub weather_cache: Arc<dyn WeatherCacheRepository>,
    pub visits: Arc<dyn VisitCounterRepository>,
    pub health: Arc<dyn StoreHealth>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            itineraries: Arc::new(memory::MemoryItineraryRepository::default()),
            guest_itineraries: Arc::new(memory::MemoryGuestItineraryRepository::default()),
            profiles: Arc::new(memory::MemoryProfileRepository::default()),
            activity_images: Arc::new(memory::MemoryActivityImageRepository::default()),
            weather_cache: Arc::new(memory::MemoryWeatherCacheRepository::default()),
            visits: Arc::new(memory::MemoryVisitCounterRepository::default()),
            health: Arc::new(memory::MemoryStoreHealth),
        }
    }

    pub fn mongo(client: Arc<mongodb::Client>, database: &str) -> Self {
        let db = client.database(database);
        Self {
            itineraries: Arc::new(mongo::MongoItineraryRepository::new(&db)),
            guest_itineraries: Arc::new(mongo::MongoGuestItineraryRepository::new(&db)),
            profiles: Arc::new(mongo::MongoProfileRepository::new(&db)),
            activity_images: Arc::new(mongo::MongoActivityImageRepository::new(&db)),
            weather_cache: Arc::new(mongo::MongoWeatherCacheRepository::new(&db)),
            visits: Arc::new(mongo::MongoVisitCounterRepository::new(&db)),
            health: Arc::new(mongo::MongoStoreHealth::new(db)),
        }
    }
}
