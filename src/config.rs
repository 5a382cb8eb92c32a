use std::env;
use std::time::Duration;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;
const DATABASE: &str = "Itinera";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENAI_MODEL: &str = "gpt-4o-mini";
const GENERATION_TIMEOUT_SECS: u64 = 60;

/// Runtime settings read from the process environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,
    pub jwt_secret: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub unsplash_access_key: Option<String>,
    pub weather_api_key: Option<String>,
    pub generation_timeout: Duration,
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

impl AppConfig {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|port| port.parse().ok())
            .unwrap_or(PORT);
        let timeout_secs = env::var("GENERATION_TIMEOUT_SECS")
            .ok()
            .and_then(|secs| secs.parse().ok())
            .unwrap_or(GENERATION_TIMEOUT_SECS);

        let jwt_secret = optional("JWT_SECRET").unwrap_or_else(|| {
            log::warn!("JWT_SECRET not set, falling back to the development secret");
            "default_secret".to_string()
        });

        Self {
            host: optional("HOST").unwrap_or_else(|| HOST.to_string()),
            port,
            mongodb_uri: optional("MONGODB_URI"),
            mongodb_database: optional("MONGODB_DATABASE").unwrap_or_else(|| DATABASE.to_string()),
            jwt_secret,
            openai_api_key: optional("OPENAI_API_KEY"),
            openai_base_url: optional("OPENAI_BASE_URL").unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            openai_model: optional("OPENAI_MODEL").unwrap_or_else(|| OPENAI_MODEL.to_string()),
            unsplash_access_key: optional("UNSPLASH_ACCESS_KEY"),
            weather_api_key: optional("WEATHER_API_KEY"),
            generation_timeout: Duration::from_secs(timeout_secs),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: HOST.to_string(),
            port: PORT,
            mongodb_uri: None,
            mongodb_database: DATABASE.to_string(),
            jwt_secret: "default_secret".to_string(),
            openai_api_key: None,
            openai_base_url: OPENAI_BASE_URL.to_string(),
            openai_model: OPENAI_MODEL.to_string(),
            unsplash_access_key: None,
            weather_api_key: None,
            generation_timeout: Duration::from_secs(GENERATION_TIMEOUT_SECS),
        }
    }
}
