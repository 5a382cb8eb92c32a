use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    location: String,
    date: NaiveDate,
}

/*
    GET /api/weather?location=&date=
*/
pub async fn forecast(
    query: web::Query<WeatherQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let WeatherQuery { location, date } = query.into_inner();
    if location.trim().is_empty() {
        return Err(ApiError::validation("Location is required"));
    }
    let record = state.weather_service().get_forecast(&location, date).await;
    Ok(HttpResponse::Ok().json(record))
}
