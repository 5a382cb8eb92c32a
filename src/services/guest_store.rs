//! Itineraries created by an anonymous session.
//!
//! The store is owned by a single client context and mutated through `&mut self`,
//! so no locking is involved. The remote `GuestItineraries` collection is the
//! source of truth; a JSON mirror in durable storage covers remote outages.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::db::{GuestItineraryRepository, ItineraryRepository};
use crate::error::ApiError;
use crate::models::itinerary::{Itinerary, NewItinerary, Owner};
use crate::services::itinerary_generation_service::ItinerarySink;
use crate::services::session_service::{DurableStorage, SessionIdentityProvider};

pub const GUEST_ITINERARIES_KEY: &str = "itinera_guest_itineraries";
/// Marks ids minted locally because the remote insert failed.
pub const LOCAL_ID_PREFIX: &str = "local_";

pub fn is_local_id(id: &str) -> bool {
    id.starts_with(LOCAL_ID_PREFIX)
}

pub struct GuestItineraryStore {
    session_id: String,
    remote: Arc<dyn GuestItineraryRepository>,
    storage: Arc<dyn DurableStorage>,
    itineraries: Vec<Itinerary>,
    local_sequence: u64,
}

impl GuestItineraryStore {
    /// Loads the session's itineraries from the remote store, or from the local mirror when it is unreachable.
    pub async fn init(
        identity: &SessionIdentityProvider,
        remote: Arc<dyn GuestItineraryRepository>,
        storage: Arc<dyn DurableStorage>,
    ) -> Self {
        let session_id = identity.get_or_create_session_id();
        Self::for_session(session_id, remote, storage).await
    }

    pub async fn for_session(
        session_id: String,
        remote: Arc<dyn GuestItineraryRepository>,
        storage: Arc<dyn DurableStorage>,
    ) -> Self {
        let mirrored = read_mirror(storage.as_ref());

        let itineraries = match remote.list_for_session(&session_id).await {
            Ok(mut rows) => {
                // Keep anything that never made it to the remote store.
                rows.extend(mirrored.into_iter().filter(|row| is_local_id(&row.id)));
                rows
            }
            Err(e) => {
                log::warn!("Failed to load guest itineraries, using local copy: {}", e);
                mirrored
            }
        };

        let store = Self {
            session_id,
            remote,
            storage,
            itineraries,
            local_sequence: 0,
        };
        store.write_mirror();
        store
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Saves one itinerary and returns its id. Never blocks the flow on remote failure.
    pub async fn add_guest_itinerary(&mut self, itinerary: NewItinerary) -> String {
        self.add(itinerary).await.id
    }

    async fn add(&mut self, itinerary: NewItinerary) -> Itinerary {
        let saved = match self.remote.insert(&self.session_id, itinerary.clone()).await {
            Ok(saved) => saved,
            Err(e) => {
                log::warn!("Remote guest insert failed, keeping itinerary locally: {}", e);
                let id = self.next_local_id();
                itinerary.into_itinerary(id, Owner::Guest(self.session_id.clone()), Utc::now())
            }
        };
        self.itineraries.push(saved.clone());
        self.write_mirror();
        saved
    }

    pub fn get_guest_itineraries(&self) -> &[Itinerary] {
        &self.itineraries
    }

    /// Forgets local state only; remote rows are left in place.
    pub fn clear_guest_itineraries(&mut self) {
        self.itineraries.clear();
        if let Err(e) = self.storage.remove(GUEST_ITINERARIES_KEY) {
            log::warn!("Failed to clear local guest itineraries: {}", e);
        }
    }

    /// Copies every guest itinerary to `user_id`, then clears local state.
    ///
    /// Any insert failure aborts the migration and leaves the guest list as it was.
    /// Records already migrated by an earlier, interrupted run are skipped.
    pub async fn migrate_guest_itineraries_to_user(
        &mut self,
        user_id: &str,
        target: &dyn ItineraryRepository,
    ) -> Result<Vec<Itinerary>, ApiError> {
        if self.itineraries.is_empty() {
            return Ok(Vec::new());
        }

        let source_ids: Vec<String> = self.itineraries.iter().map(|row| row.id.clone()).collect();
        let already_migrated = target
            .migrated_sources(user_id, &source_ids)
            .await
            .map_err(|e| ApiError::Persistence(format!("Failed to migrate itineraries: {}", e)))?;

        let pending: Vec<NewItinerary> = self
            .itineraries
            .iter()
            .filter(|row| !already_migrated.contains(&row.id))
            .map(|row| {
                let mut copy = row.to_new();
                copy.migrated_from = Some(row.id.clone());
                if copy.duration_days == 0 {
                    copy.duration_days = copy.days.len() as u32;
                }
                copy
            })
            .collect();

        let migrated = target
            .insert_many(user_id, pending)
            .await
            .map_err(|e| ApiError::Persistence(format!("Failed to migrate itineraries: {}", e)))?;

        log::info!(
            "Migrated {} guest itineraries from session {} to user {}",
            migrated.len(),
            self.session_id,
            user_id
        );
        self.clear_guest_itineraries();
        Ok(migrated)
    }

    fn next_local_id(&mut self) -> String {
        self.local_sequence += 1;
        format!(
            "{}{}_{}",
            LOCAL_ID_PREFIX,
            Utc::now().timestamp_millis(),
            self.local_sequence
        )
    }

    fn write_mirror(&self) {
        let result = serde_json::to_string(&self.itineraries)
            .map_err(|e| e.to_string())
            .and_then(|raw| {
                self.storage
                    .set(GUEST_ITINERARIES_KEY, &raw)
                    .map_err(|e| e.to_string())
            });
        if let Err(e) = result {
            log::warn!("Failed to mirror guest itineraries locally: {}", e);
        }
    }
}

fn read_mirror(storage: &dyn DurableStorage) -> Vec<Itinerary> {
    match storage.get(GUEST_ITINERARIES_KEY) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            log::warn!("Discarding unreadable guest itinerary mirror: {}", e);
            Vec::new()
        }),
        Ok(None) => Vec::new(),
        Err(e) => {
            log::warn!("Failed to read guest itinerary mirror: {}", e);
            Vec::new()
        }
    }
}

#[async_trait]
impl ItinerarySink for GuestItineraryStore {
    async fn save(&mut self, itinerary: NewItinerary) -> Result<Itinerary, ApiError> {
        Ok(self.add(itinerary).await)
    }
}
