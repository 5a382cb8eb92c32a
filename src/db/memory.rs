use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use super::{
    ActivityImageRepository, GuestItineraryRepository, ItineraryRepository, ProfileRepository,
    StoreError, StoreHealth, VisitCounterRepository, WeatherCacheRepository,
};
use crate::models::itinerary::{Day, Itinerary, NewItinerary, Owner};
use crate::models::profile::TravelerProfile;
use crate::models::weather::WeatherRecord;

fn lock<T>(mutex: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Database("in-memory store poisoned".to_string()))
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Shared switch letting callers simulate an outage of a store.
#[derive(Default)]
struct Outage(AtomicBool);

impl Outage {
    fn check(&self) -> Result<(), StoreError> {
        if self.0.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("store is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
pub struct MemoryItineraryRepository {
    rows: Mutex<Vec<Itinerary>>,
    outage: Outage,
}

impl MemoryItineraryRepository {
    pub fn set_unavailable(&self, unavailable: bool) {
        self.outage.0.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl ItineraryRepository for MemoryItineraryRepository {
    async fn insert(&self, user_id: &str, itinerary: NewItinerary) -> Result<Itinerary, StoreError> {
        self.outage.check()?;
        let row = itinerary.into_itinerary(new_id(), Owner::User(user_id.to_string()), Utc::now());
        lock(&self.rows)?.push(row.clone());
        Ok(row)
    }

    async fn insert_many(
        &self,
        user_id: &str,
        itineraries: Vec<NewItinerary>,
    ) -> Result<Vec<Itinerary>, StoreError> {
        self.outage.check()?;
        let now = Utc::now();
        let inserted: Vec<Itinerary> = itineraries
            .into_iter()
            .map(|itinerary| itinerary.into_itinerary(new_id(), Owner::User(user_id.to_string()), now))
            .collect();
        lock(&self.rows)?.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn find_maybe(&self, id: &str) -> Result<Option<Itinerary>, StoreError> {
        self.outage.check()?;
        Ok(lock(&self.rows)?.iter().find(|row| row.id == id).cloned())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Itinerary>, StoreError> {
        self.outage.check()?;
        let mut rows: Vec<Itinerary> = lock(&self.rows)?
            .iter()
            .filter(|row| row.is_owned_by_user(user_id))
            .cloned()
            .collect();
        rows.reverse();
        Ok(rows)
    }

    async fn migrated_sources(
        &self,
        user_id: &str,
        source_ids: &[String],
    ) -> Result<Vec<String>, StoreError> {
        self.outage.check()?;
        Ok(lock(&self.rows)?
            .iter()
            .filter(|row| row.is_owned_by_user(user_id))
            .filter_map(|row| row.migrated_from.clone())
            .filter(|source| source_ids.contains(source))
            .collect())
    }

    async fn update_days(&self, id: &str, days: &[Day]) -> Result<(), StoreError> {
        self.outage.check()?;
        let mut rows = lock(&self.rows)?;
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| StoreError::NotFound("Itinerary not found".to_string()))?;
        row.days = days.to_vec();
        Ok(())
    }

    async fn delete_owned(&self, id: &str, user_id: &str) -> Result<bool, StoreError> {
        self.outage.check()?;
        let mut rows = lock(&self.rows)?;
        let before = rows.len();
        rows.retain(|row| !(row.id == id && row.is_owned_by_user(user_id)));
        Ok(rows.len() < before)
    }
}

#[derive(Default)]
pub struct MemoryGuestItineraryRepository {
    rows: Mutex<Vec<Itinerary>>,
    outage: Outage,
}

impl MemoryGuestItineraryRepository {
    pub fn set_unavailable(&self, unavailable: bool) {
        self.outage.0.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl GuestItineraryRepository for MemoryGuestItineraryRepository {
    async fn insert(&self, session_id: &str, itinerary: NewItinerary) -> Result<Itinerary, StoreError> {
        self.outage.check()?;
        let row = itinerary.into_itinerary(new_id(), Owner::Guest(session_id.to_string()), Utc::now());
        lock(&self.rows)?.push(row.clone());
        Ok(row)
    }

    async fn list_for_session(&self, session_id: &str) -> Result<Vec<Itinerary>, StoreError> {
        self.outage.check()?;
        Ok(lock(&self.rows)?
            .iter()
            .filter(|row| matches!(&row.owner, Owner::Guest(id) if id == session_id))
            .cloned()
            .collect())
    }

    async fn find_maybe(&self, session_id: &str, id: &str) -> Result<Option<Itinerary>, StoreError> {
        Ok(self
            .list_for_session(session_id)
            .await?
            .into_iter()
            .find(|row| row.id == id))
    }
}

#[derive(Default)]
pub struct MemoryProfileRepository {
    rows: Mutex<HashMap<String, TravelerProfile>>,
}

#[async_trait]
impl ProfileRepository for MemoryProfileRepository {
    async fn find_maybe(&self, user_id: &str) -> Result<Option<TravelerProfile>, StoreError> {
        Ok(lock(&self.rows)?.get(user_id).cloned())
    }

    async fn upsert(&self, profile: &TravelerProfile) -> Result<(), StoreError> {
        lock(&self.rows)?.insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryActivityImageRepository {
    rows: Mutex<HashMap<String, Vec<String>>>,
}

#[async_trait]
impl ActivityImageRepository for MemoryActivityImageRepository {
    async fn find_maybe(&self, activity_hash: &str) -> Result<Option<Vec<String>>, StoreError> {
        Ok(lock(&self.rows)?.get(activity_hash).cloned())
    }

    async fn store(&self, activity_hash: &str, urls: &[String]) -> Result<(), StoreError> {
        lock(&self.rows)?.insert(activity_hash.to_string(), urls.to_vec());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryWeatherCacheRepository {
    rows: Mutex<HashMap<(String, NaiveDate), WeatherRecord>>,
}

#[async_trait]
impl WeatherCacheRepository for MemoryWeatherCacheRepository {
    async fn find_maybe(
        &self,
        location: &str,
        date: NaiveDate,
    ) -> Result<Option<WeatherRecord>, StoreError> {
        Ok(lock(&self.rows)?.get(&(location.to_string(), date)).cloned())
    }

    async fn store(&self, record: &WeatherRecord) -> Result<(), StoreError> {
        lock(&self.rows)?.insert((record.location.clone(), record.date), record.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryVisitCounterRepository {
    count: AtomicI64,
}

#[async_trait]
impl VisitCounterRepository for MemoryVisitCounterRepository {
    async fn increment(&self) -> Result<i64, StoreError> {
        Ok(self.count.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn current(&self) -> Result<i64, StoreError> {
        Ok(self.count.load(Ordering::SeqCst))
    }
}

pub struct MemoryStoreHealth;

#[async_trait]
impl StoreHealth for MemoryStoreHealth {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_itinerary(tier: &str) -> NewItinerary {
        NewItinerary {
            destination: "Goa".to_string(),
            image_url: None,
            tier: tier.to_string(),
            days: Vec::new(),
            total_cost: 1000,
            duration_days: 2,
            migrated_from: None,
        }
    }

    #[actix_rt::test]
    async fn test_delete_only_by_owner() {
        let repo = MemoryItineraryRepository::default();
        let row = repo.insert("alice", new_itinerary("Budget")).await.unwrap();

        assert!(!repo.delete_owned(&row.id, "bob").await.unwrap());
        assert!(repo.delete_owned(&row.id, "alice").await.unwrap());
        assert!(matches!(
            repo.find_single(&row.id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[actix_rt::test]
    async fn test_migrated_sources_are_per_user() {
        let repo = MemoryItineraryRepository::default();
        let mut copy = new_itinerary("Luxe");
        copy.migrated_from = Some("guest_row_1".to_string());
        repo.insert_many("alice", vec![copy]).await.unwrap();

        let sources = ["guest_row_1".to_string(), "guest_row_2".to_string()];
        assert_eq!(
            repo.migrated_sources("alice", &sources).await.unwrap(),
            vec!["guest_row_1".to_string()]
        );
        assert!(repo.migrated_sources("bob", &sources).await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_outage_switch() {
        let repo = MemoryGuestItineraryRepository::default();
        repo.set_unavailable(true);
        assert!(matches!(
            repo.insert("guest_1", new_itinerary("Budget")).await,
            Err(StoreError::Unavailable(_))
        ));
        repo.set_unavailable(false);
        repo.insert("guest_1", new_itinerary("Budget")).await.unwrap();
        assert_eq!(repo.list_for_session("guest_1").await.unwrap().len(), 1);
        assert!(repo.list_for_session("guest_2").await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_visit_counter_increments() {
        let counter = MemoryVisitCounterRepository::default();
        assert_eq!(counter.current().await.unwrap(), 0);
        assert_eq!(counter.increment().await.unwrap(), 1);
        assert_eq!(counter.increment().await.unwrap(), 2);
        assert_eq!(counter.current().await.unwrap(), 2);
    }
}
