use std::collections::BTreeMap;
use std::env;

use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    services: BTreeMap<String, ServiceStatus>,
    environment: String,
    version: String,
}

#[derive(Serialize, Clone)]
struct ServiceStatus {
    status: String,
    details: Option<String>,
}

impl ServiceStatus {
    fn ok(details: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            details: Some(details.into()),
        }
    }

    fn error(details: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            details: Some(details.into()),
        }
    }
}

/// Optional capabilities are reported as "fallback" since the service still answers without them.
fn capability(configured: bool, name: &str, key: &str) -> ServiceStatus {
    if configured {
        ServiceStatus::ok(format!("{} configured", name))
    } else {
        ServiceStatus {
            status: "fallback".to_string(),
            details: Some(format!("{} not configured, serving placeholder data", key)),
        }
    }
}

/*
    GET /health
*/
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let mut services = BTreeMap::new();

    let database = match state.repos.health.ping().await {
        Ok(()) => ServiceStatus::ok("Connected successfully"),
        Err(e) => {
            log::error!("Database health check failed: {}", e);
            ServiceStatus::error(format!("Failed to connect: {}", e))
        }
    };
    let degraded = database.status != "ok";
    services.insert("database".to_string(), database);

    let config = &state.config;
    services.insert(
        "llm".to_string(),
        capability(config.openai_api_key.is_some(), "LLM", "OPENAI_API_KEY"),
    );
    services.insert(
        "images".to_string(),
        capability(config.unsplash_access_key.is_some(), "Image search", "UNSPLASH_ACCESS_KEY"),
    );
    services.insert(
        "weather".to_string(),
        capability(config.weather_api_key.is_some(), "Weather", "WEATHER_API_KEY"),
    );

    HttpResponse::Ok().json(HealthStatus {
        status: if degraded { "degraded" } else { "ok" }.to_string(),
        services,
        environment: env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
