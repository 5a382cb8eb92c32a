pub mod guest;
pub mod health;
pub mod itinerary;
pub mod package;
pub mod profile;
pub mod recommendation;
pub mod visits;
pub mod weather;

use actix_web::web;

use crate::middleware::auth::AuthMiddleware;

/// Registers every route. `jwt_secret` verifies bearer tokens.
pub fn configure(cfg: &mut web::ServiceConfig, jwt_secret: &str) {
    cfg.route("/health", web::get().to(health::health_check)).service(
        web::scope("/api")
            // Public routes
            .service(
                web::resource("/visits")
                    .route(web::get().to(visits::current))
                    .route(web::post().to(visits::increment)),
            )
            .route("/weather", web::get().to(weather::forecast))
            .service(
                web::scope("/guest")
                    .service(
                        web::resource("/migrate")
                            .wrap(AuthMiddleware::required(jwt_secret))
                            .route(web::post().to(guest::migrate)),
                    )
                    .service(
                        web::resource("/itineraries")
                            .route(web::get().to(guest::list))
                            .route(web::post().to(guest::create)),
                    )
                    .route(
                        "/itineraries/{id}/export/{format}",
                        web::get().to(guest::export),
                    ),
            )
            .service(
                web::scope("/itineraries")
                    // Users and guests
                    .service(
                        web::resource("/generate")
                            .wrap(AuthMiddleware::optional(jwt_secret))
                            .route(web::post().to(itinerary::generate)),
                    )
                    // Protected routes
                    .service(
                        web::scope("")
                            .wrap(AuthMiddleware::required(jwt_secret))
                            .route("", web::get().to(itinerary::list))
                            .service(
                                web::resource("/{id}")
                                    .route(web::get().to(itinerary::get_by_id))
                                    .route(web::delete().to(itinerary::delete)),
                            )
                            .route("/{id}/images", web::post().to(itinerary::populate_images))
                            .route(
                                "/{id}/export/{format}",
                                web::get().to(itinerary::export),
                            ),
                    ),
            )
            // Protected routes
            .service(
                web::scope("")
                    .wrap(AuthMiddleware::required(jwt_secret))
                    .service(
                        web::resource("/profile")
                            .route(web::get().to(profile::get))
                            .route(web::put().to(profile::upsert)),
                    )
                    .route("/packages/generate", web::post().to(package::generate))
                    .route("/recommendations", web::post().to(recommendation::recommend)),
            ),
    );
}
