use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use itinera_api::config::AppConfig;
use itinera_api::db::{mongo::create_mongo_client, Repositories};
use itinera_api::routes;
use itinera_api::services::export::document::HttpImageFetcher;
use itinera_api::services::image_service::UnsplashClient;
use itinera_api::services::llm_service::OpenAiClient;
use itinera_api::services::weather_service::WeatherApiClient;
use itinera_api::AppState;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    } else {
        log::info!("Release mode");
    }

    let config = AppConfig::from_env();
    let mongo_uri = config
        .mongodb_uri
        .clone()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "MONGODB_URI must be set"))?;
    let client = create_mongo_client(&mongo_uri)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let state = web::Data::new(AppState {
        repos: Repositories::mongo(client, &config.mongodb_database),
        llm: Arc::new(OpenAiClient::from_config(&config)),
        image_search: Arc::new(UnsplashClient::from_config(&config)),
        weather: Arc::new(WeatherApiClient::from_config(&config)),
        image_fetcher: Arc::new(HttpImageFetcher::new()),
        config: config.clone(),
    });

    log::info!("Starting HTTP server on {}:{}", config.host, config.port);

    let jwt_secret = config.jwt_secret.clone();
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(state.clone())
            .configure(|cfg| routes::configure(cfg, &jwt_secret))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
