use actix_web::{web, HttpResponse};

use crate::error::ApiError;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::routes::profile::load_profile;
use crate::AppState;

/*
    POST /api/packages/generate
*/
pub async fn generate(user: AuthenticatedUser, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let profile = load_profile(&state, &user.user_id).await?;
    let variations = state.package_generator().generate_variations(&profile).await?;
    Ok(HttpResponse::Ok().json(variations))
}
