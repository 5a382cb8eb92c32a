use actix_web::{web, HttpResponse};
use chrono::Utc;

use crate::error::ApiError;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::profile::{ProfileInput, TravelerProfile};
use crate::AppState;

/// The caller's stored profile, or 404 when they have not filled one in.
pub(crate) async fn load_profile(state: &AppState, user_id: &str) -> Result<TravelerProfile, ApiError> {
    state
        .repos
        .profiles
        .find_maybe(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))
}

/*
    GET /api/profile
*/
pub async fn get(user: AuthenticatedUser, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let profile = load_profile(&state, &user.user_id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/*
    PUT /api/profile
*/
pub async fn upsert(
    user: AuthenticatedUser,
    body: web::Json<ProfileInput>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let profile = body.into_inner().into_profile(&user.user_id, Utc::now())?;
    state.repos.profiles.upsert(&profile).await?;
    Ok(HttpResponse::Ok().json(profile))
}
