use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::error::ApiError;
use crate::middleware::auth_context::{AuthenticatedUser, GuestSession};
use crate::models::itinerary::{Itinerary, NewItinerary};
use crate::routes::itinerary::export_response;
use crate::services::guest_store::GuestItineraryStore;
use crate::services::session_service::MemoryStorage;
use crate::AppState;

#[derive(Serialize)]
struct Created {
    id: String,
}

#[derive(Serialize)]
struct Migrated {
    migrated: usize,
    itineraries: Vec<Itinerary>,
}

async fn open_store(state: &AppState, session_id: String) -> GuestItineraryStore {
    GuestItineraryStore::for_session(
        session_id,
        state.repos.guest_itineraries.clone(),
        Arc::new(MemoryStorage::default()),
    )
    .await
}

/*
    GET /api/guest/itineraries
*/
pub async fn list(session: GuestSession, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let store = open_store(&state, session.0).await;
    Ok(HttpResponse::Ok().json(store.get_guest_itineraries()))
}

/*
    POST /api/guest/itineraries
*/
pub async fn create(
    session: GuestSession,
    body: web::Json<NewItinerary>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let mut itinerary = body.into_inner();
    itinerary.validate()?;
    itinerary.migrated_from = None;

    let mut store = open_store(&state, session.0).await;
    let id = store.add_guest_itinerary(itinerary).await;
    Ok(HttpResponse::Created().json(Created { id }))
}

/*
    POST /api/guest/migrate
*/
pub async fn migrate(
    user: AuthenticatedUser,
    session: GuestSession,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let mut store = open_store(&state, session.0).await;
    let itineraries = store
        .migrate_guest_itineraries_to_user(&user.user_id, state.repos.itineraries.as_ref())
        .await?;

    log::info!(
        "Migrated {} guest itineraries to user {}",
        itineraries.len(),
        user.user_id
    );
    Ok(HttpResponse::Ok().json(Migrated {
        migrated: itineraries.len(),
        itineraries,
    }))
}

/*
    GET /api/guest/itineraries/{id}/export/{format}
*/
pub async fn export(
    path: web::Path<(String, String)>,
    session: GuestSession,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (id, format) = path.into_inner();
    let itinerary = state
        .repos
        .guest_itineraries
        .find_maybe(&session.0, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Itinerary not found".to_string()))?;
    export_response(&itinerary, &format, &state).await
}
