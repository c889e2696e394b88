/// HTTP handlers for post-service
pub mod auth;
pub mod health;
pub mod posts;

use crate::error::AppError;
use actix_web::{web, HttpRequest};

/// Register the public API routes.
///
/// Malformed JSON bodies and non-numeric path ids are reported through
/// `AppError::Validation` so every client error shares one body shape.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(1024 * 1024)
            .error_handler(|err, _req: &HttpRequest| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req: &HttpRequest| AppError::Validation(err.to_string()).into()),
    )
    .route("/", web::get().to(auth::welcome))
    .route("/register", web::post().to(auth::register))
    .route("/login", web::post().to(auth::login))
    .route("/info", web::get().to(auth::info))
    .route("/logout", web::get().to(auth::logout))
    .route("/create-post", web::post().to(posts::create_post))
    .route("/posts", web::get().to(posts::list_posts))
    .service(
        web::resource("/posts/{post_id}")
            .route(web::get().to(posts::get_post))
            .route(web::put().to(posts::update_post))
            .route(web::delete().to(posts::delete_post)),
    )
    .route("/posts/{post_id}/comments", web::post().to(posts::add_comment))
    .route("/posts/{post_id}/likes", web::post().to(posts::add_like));
}

/// Operational endpoints, kept apart from the API routes
pub fn configure_ops(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health))
        .route("/health/ready", web::get().to(health::readiness))
        .route("/metrics", web::get().to(crate::metrics::serve_metrics));
}
