use actix_web::{web, HttpResponse};

use crate::error::ApiError;
use crate::models::VisitCount;
use crate::AppState;

/*
    GET /api/visits
*/
pub async fn current(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let count = state.repos.visits.current().await?;
    Ok(HttpResponse::Ok().json(VisitCount { count }))
}

/*
    POST /api/visits
*/
pub async fn increment(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let count = state.repos.visits.increment().await?;
    Ok(HttpResponse::Ok().json(VisitCount { count }))
}
