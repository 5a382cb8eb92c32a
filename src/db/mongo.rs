use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId},
    options::{ClientOptions, ReturnDocument, ServerApi, ServerApiVersion},
    Client, Collection, Database,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::{
    ActivityImageRepository, GuestItineraryRepository, ItineraryRepository, ProfileRepository,
    StoreError, StoreHealth, VisitCounterRepository, WeatherCacheRepository,
};
use crate::models::itinerary::{Day, Itinerary, NewItinerary, Owner};
use crate::models::profile::TravelerProfile;
use crate::models::weather::WeatherRecord;

const VISIT_COUNTER_ID: &str = "visits";

pub async fn create_mongo_client(uri: &str) -> Result<Arc<Client>, StoreError> {
    log::info!("Connecting to MongoDB");

    let mut client_options = ClientOptions::parse(uri)
        .await
        .map_err(|e| StoreError::Unavailable(format!("MongoDB URI may be incorrect: {}", e)))?;

    client_options.connect_timeout = Some(Duration::from_secs(10));
    client_options.server_selection_timeout = Some(Duration::from_secs(10));
    client_options.max_pool_size = Some(10);
    client_options.min_pool_size = Some(1);

    let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
    client_options.server_api = Some(server_api);

    let client = Client::with_options(client_options)?;

    match client.database("admin").run_command(doc! {"ping": 1}).await {
        Ok(_) => log::info!("Connected to MongoDB and verified with ping"),
        Err(e) => {
            log::warn!("Connected to MongoDB but ping failed: {}", e);
            log::warn!("The API may still work, but some functionality might be impaired");
        }
    }

    Ok(Arc::new(client))
}

fn parse_object_id(id: &str) -> Result<ObjectId, StoreError> {
    ObjectId::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))
}

#[derive(Debug, Serialize, Deserialize)]
struct ItineraryDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
    destination: String,
    image_url: Option<String>,
    tier: String,
    days_json: Vec<Day>,
    total_cost: u64,
    duration_days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    migrated_from: Option<String>,
    created_at: DateTime<Utc>,
}

impl ItineraryDocument {
    fn new(owner: &Owner, itinerary: NewItinerary) -> Self {
        let (user_id, session_id) = match owner {
            Owner::User(id) => (Some(id.clone()), None),
            Owner::Guest(id) => (None, Some(id.clone())),
        };
        Self {
            id: ObjectId::new(),
            user_id,
            session_id,
            destination: itinerary.destination,
            image_url: itinerary.image_url,
            tier: itinerary.tier,
            days_json: itinerary.days,
            total_cost: itinerary.total_cost,
            duration_days: itinerary.duration_days,
            migrated_from: itinerary.migrated_from,
            created_at: Utc::now(),
        }
    }

    fn into_itinerary(self) -> Result<Itinerary, StoreError> {
        let owner = match (self.user_id, self.session_id) {
            (Some(user_id), None) => Owner::User(user_id),
            (None, Some(session_id)) => Owner::Guest(session_id),
            _ => {
                return Err(StoreError::Database(format!(
                    "itinerary {} must have exactly one owner",
                    self.id
                )))
            }
        };
        Ok(Itinerary {
            id: self.id.to_hex(),
            owner,
            destination: self.destination,
            image_url: self.image_url,
            tier: self.tier,
            days: self.days_json,
            total_cost: self.total_cost,
            duration_days: self.duration_days,
            migrated_from: self.migrated_from,
            created_at: self.created_at,
        })
    }
}

fn into_itineraries(documents: Vec<ItineraryDocument>) -> Result<Vec<Itinerary>, StoreError> {
    documents
        .into_iter()
        .map(ItineraryDocument::into_itinerary)
        .collect()
}

pub struct MongoItineraryRepository {
    collection: Collection<ItineraryDocument>,
}

impl MongoItineraryRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("Itineraries"),
        }
    }
}

#[async_trait]
impl ItineraryRepository for MongoItineraryRepository {
    async fn insert(&self, user_id: &str, itinerary: NewItinerary) -> Result<Itinerary, StoreError> {
        let document = ItineraryDocument::new(&Owner::User(user_id.to_string()), itinerary);
        self.collection.insert_one(&document).await?;
        document.into_itinerary()
    }

    async fn insert_many(
        &self,
        user_id: &str,
        itineraries: Vec<NewItinerary>,
    ) -> Result<Vec<Itinerary>, StoreError> {
        if itineraries.is_empty() {
            return Ok(Vec::new());
        }
        let owner = Owner::User(user_id.to_string());
        let documents: Vec<ItineraryDocument> = itineraries
            .into_iter()
            .map(|itinerary| ItineraryDocument::new(&owner, itinerary))
            .collect();
        self.collection.insert_many(&documents).await?;
        into_itineraries(documents)
    }

    async fn find_maybe(&self, id: &str) -> Result<Option<Itinerary>, StoreError> {
        let object_id = parse_object_id(id)?;
        match self.collection.find_one(doc! { "_id": object_id }).await? {
            Some(document) => Ok(Some(document.into_itinerary()?)),
            None => Ok(None),
        }
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Itinerary>, StoreError> {
        let cursor = self
            .collection
            .find(doc! { "user_id": user_id })
            .sort(doc! { "created_at": -1 })
            .await?;
        let documents: Vec<ItineraryDocument> = cursor.try_collect().await?;
        into_itineraries(documents)
    }

    async fn migrated_sources(
        &self,
        user_id: &str,
        source_ids: &[String],
    ) -> Result<Vec<String>, StoreError> {
        if source_ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self
            .collection
            .find(doc! { "user_id": user_id, "migrated_from": { "$in": source_ids.to_vec() } })
            .await?;
        let documents: Vec<ItineraryDocument> = cursor.try_collect().await?;
        Ok(documents
            .into_iter()
            .filter_map(|document| document.migrated_from)
            .collect())
    }

    async fn update_days(&self, id: &str, days: &[Day]) -> Result<(), StoreError> {
        let object_id = parse_object_id(id)?;
        let days = mongodb::bson::to_bson(days)?;
        let result = self
            .collection
            .update_one(doc! { "_id": object_id }, doc! { "$set": { "days_json": days } })
            .await?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound("Itinerary not found".to_string()));
        }
        Ok(())
    }

    async fn delete_owned(&self, id: &str, user_id: &str) -> Result<bool, StoreError> {
        let object_id = parse_object_id(id)?;
        let result = self
            .collection
            .delete_one(doc! { "_id": object_id, "user_id": user_id })
            .await?;
        Ok(result.deleted_count > 0)
    }
}

pub struct MongoGuestItineraryRepository {
    collection: Collection<ItineraryDocument>,
}

impl MongoGuestItineraryRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("GuestItineraries"),
        }
    }
}

#[async_trait]
impl GuestItineraryRepository for MongoGuestItineraryRepository {
    async fn insert(&self, session_id: &str, itinerary: NewItinerary) -> Result<Itinerary, StoreError> {
        let document = ItineraryDocument::new(&Owner::Guest(session_id.to_string()), itinerary);
        self.collection.insert_one(&document).await?;
        document.into_itinerary()
    }

    async fn list_for_session(&self, session_id: &str) -> Result<Vec<Itinerary>, StoreError> {
        let cursor = self
            .collection
            .find(doc! { "session_id": session_id })
            .sort(doc! { "created_at": 1 })
            .await?;
        let documents: Vec<ItineraryDocument> = cursor.try_collect().await?;
        into_itineraries(documents)
    }

    async fn find_maybe(&self, session_id: &str, id: &str) -> Result<Option<Itinerary>, StoreError> {
        let object_id = parse_object_id(id)?;
        match self
            .collection
            .find_one(doc! { "_id": object_id, "session_id": session_id })
            .await?
        {
            Some(document) => Ok(Some(document.into_itinerary()?)),
            None => Ok(None),
        }
    }
}

pub struct MongoProfileRepository {
    collection: Collection<TravelerProfile>,
}

impl MongoProfileRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("UserProfiles"),
        }
    }
}

#[async_trait]
impl ProfileRepository for MongoProfileRepository {
    async fn find_maybe(&self, user_id: &str) -> Result<Option<TravelerProfile>, StoreError> {
        Ok(self.collection.find_one(doc! { "user_id": user_id }).await?)
    }

    async fn upsert(&self, profile: &TravelerProfile) -> Result<(), StoreError> {
        self.collection
            .replace_one(doc! { "user_id": &profile.user_id }, profile)
            .upsert(true)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ActivityImageDocument {
    #[serde(rename = "_id")]
    activity_hash: String,
    urls: Vec<String>,
    cached_at: DateTime<Utc>,
}

pub struct MongoActivityImageRepository {
    collection: Collection<ActivityImageDocument>,
}

impl MongoActivityImageRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("ActivityImages"),
        }
    }
}

#[async_trait]
impl ActivityImageRepository for MongoActivityImageRepository {
    async fn find_maybe(&self, activity_hash: &str) -> Result<Option<Vec<String>>, StoreError> {
        Ok(self
            .collection
            .find_one(doc! { "_id": activity_hash })
            .await?
            .map(|document| document.urls))
    }

    async fn store(&self, activity_hash: &str, urls: &[String]) -> Result<(), StoreError> {
        let document = ActivityImageDocument {
            activity_hash: activity_hash.to_string(),
            urls: urls.to_vec(),
            cached_at: Utc::now(),
        };
        self.collection
            .replace_one(doc! { "_id": activity_hash }, &document)
            .upsert(true)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WeatherDocument {
    #[serde(rename = "_id")]
    key: String,
    #[serde(flatten)]
    record: WeatherRecord,
}

fn weather_key(location: &str, date: NaiveDate) -> String {
    format!("{}|{}", location, date)
}

pub struct MongoWeatherCacheRepository {
    collection: Collection<WeatherDocument>,
}

impl MongoWeatherCacheRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("WeatherCache"),
        }
    }
}

#[async_trait]
impl WeatherCacheRepository for MongoWeatherCacheRepository {
    async fn find_maybe(
        &self,
        location: &str,
        date: NaiveDate,
    ) -> Result<Option<WeatherRecord>, StoreError> {
        Ok(self
            .collection
            .find_one(doc! { "_id": weather_key(location, date) })
            .await?
            .map(|document| document.record))
    }

    async fn store(&self, record: &WeatherRecord) -> Result<(), StoreError> {
        let key = weather_key(&record.location, record.date);
        let document = WeatherDocument {
            key: key.clone(),
            record: record.clone(),
        };
        self.collection
            .replace_one(doc! { "_id": key }, &document)
            .upsert(true)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CounterDocument {
    #[serde(rename = "_id")]
    name: String,
    count: i64,
}

pub struct MongoVisitCounterRepository {
    collection: Collection<CounterDocument>,
}

impl MongoVisitCounterRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("Counters"),
        }
    }
}

#[async_trait]
impl VisitCounterRepository for MongoVisitCounterRepository {
    async fn increment(&self) -> Result<i64, StoreError> {
        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": VISIT_COUNTER_ID },
                doc! { "$inc": { "count": 1_i64 } },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated.map(|document| document.count).unwrap_or(1))
    }

    async fn current(&self) -> Result<i64, StoreError> {
        Ok(self
            .collection
            .find_one(doc! { "_id": VISIT_COUNTER_ID })
            .await?
            .map(|document| document.count)
            .unwrap_or(0))
    }
}

pub struct MongoStoreHealth {
    db: Database,
}

impl MongoStoreHealth {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StoreHealth for MongoStoreHealth {
    async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! {"ping": 1}).await?;
        Ok(())
    }
}
