use std::sync::Arc;

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;

use crate::error::ApiError;
use crate::middleware::auth_context::{AuthenticatedUser, Caller};
use crate::models::itinerary::Itinerary;
use crate::services::export::calendar::export_calendar;
use crate::services::export::document::to_document;
use crate::services::guest_store::GuestItineraryStore;
use crate::services::itinerary_generation_service::{GenerationRequest, UserItinerarySink};
use crate::services::session_service::MemoryStorage;
use crate::AppState;

#[derive(Serialize)]
struct ImagesPopulated {
    filled: usize,
    itinerary: Itinerary,
}

/// Renders `itinerary` as a downloadable file. `format` is `calendar` or `document`.
pub(crate) async fn export_response(
    itinerary: &Itinerary,
    format: &str,
    state: &AppState,
) -> Result<HttpResponse, ApiError> {
    let file = match format {
        "calendar" => export_calendar(itinerary, Utc::now())?,
        "document" => to_document(itinerary, state.image_fetcher.as_ref()).await?,
        other => return Err(ApiError::NotFound(format!("Unknown export format: {}", other))),
    };

    log::info!("Exported itinerary {} as {}", itinerary.id, file.filename);
    Ok(HttpResponse::Ok()
        .content_type(file.content_type)
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", file.filename),
        ))
        .body(file.bytes))
}

/// Loads an itinerary the user owns. Rows owned by anyone else read as missing.
async fn find_owned(state: &AppState, id: &str, user_id: &str) -> Result<Itinerary, ApiError> {
    let itinerary = state.repos.itineraries.find_single(id).await?;
    if !itinerary.is_owned_by_user(user_id) {
        return Err(ApiError::NotFound("Itinerary not found".to_string()));
    }
    Ok(itinerary)
}

/*
    POST /api/itineraries/generate
*/
pub async fn generate(
    caller: Caller,
    body: web::Json<GenerationRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    let generator = state.itinerary_generator();

    let generated = match caller {
        Caller::User(user) => {
            let profile = match state.repos.profiles.find_maybe(&user.user_id).await {
                Ok(profile) => profile,
                Err(e) => {
                    log::warn!("Profile lookup failed, generating without it: {}", e);
                    None
                }
            };
            let mut sink = UserItinerarySink::new(state.repos.itineraries.clone(), user.user_id);
            generator.generate(&request, profile.as_ref(), &mut sink).await?
        }
        Caller::Guest(session_id) => {
            let mut store = GuestItineraryStore::for_session(
                session_id,
                state.repos.guest_itineraries.clone(),
                Arc::new(MemoryStorage::default()),
            )
            .await;
            generator.generate(&request, None, &mut store).await?
        }
    };

    Ok(HttpResponse::Created().json(generated))
}

/*
    GET /api/itineraries
*/
pub async fn list(user: AuthenticatedUser, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let itineraries = state.repos.itineraries.list_for_user(&user.user_id).await?;
    Ok(HttpResponse::Ok().json(itineraries))
}

/*
    GET /api/itineraries/{id}
*/
pub async fn get_by_id(
    path: web::Path<String>,
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let itinerary = find_owned(&state, &path.into_inner(), &user.user_id).await?;
    Ok(HttpResponse::Ok().json(itinerary))
}

/*
    DELETE /api/itineraries/{id}
*/
pub async fn delete(
    path: web::Path<String>,
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    if !state.repos.itineraries.delete_owned(&id, &user.user_id).await? {
        return Err(ApiError::NotFound("Itinerary not found".to_string()));
    }
    Ok(HttpResponse::NoContent().finish())
}

/*
    POST /api/itineraries/{id}/images
*/
pub async fn populate_images(
    path: web::Path<String>,
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let mut itinerary = find_owned(&state, &path.into_inner(), &user.user_id).await?;

    let filled = state.activity_images().populate(&mut itinerary).await;
    if filled > 0 {
        state
            .repos
            .itineraries
            .update_days(&itinerary.id, &itinerary.days)
            .await?;
    }

    Ok(HttpResponse::Ok().json(ImagesPopulated { filled, itinerary }))
}

/*
    GET /api/itineraries/{id}/export/{format}
*/
pub async fn export(
    path: web::Path<(String, String)>,
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (id, format) = path.into_inner();
    let itinerary = find_owned(&state, &id, &user.user_id).await?;
    export_response(&itinerary, &format, &state).await
}
