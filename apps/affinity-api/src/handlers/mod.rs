//! HTTP handlers and route configuration.

mod affinities;
mod health;
mod recently_viewed;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/affinities")
                    .route("", web::get().to(affinities::list_affinities))
                    .route("/{id}", web::get().to(affinities::get_affinity)),
            )
            .service(
                web::scope("/users/{user_id}/recently-viewed")
                    .route("", web::get().to(recently_viewed::list_recently_viewed))
                    .route("", web::post().to(recently_viewed::add_recently_viewed))
                    .route("/merge", web::post().to(recently_viewed::merge_recently_viewed)),
            ),
    );
}
