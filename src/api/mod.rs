pub mod auth;
pub mod health;
pub mod swagger;
pub mod users;

use actix_web::web;

use crate::utils::AppError;

/// Malformed or unexpected JSON answers 400 with the usual `{message}` body.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::Validation(err.to_string()).into())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/api")
                .route("/signup", web::post().to(auth::signup))
                .route("/login", web::post().to(auth::login))
                .route("/verify", web::get().to(auth::verify_token))
                .route("/users/add", web::post().to(users::add_user))
                .route("/users", web::get().to(users::list_users))
                .route("/users/{id}/image", web::get().to(users::get_user_image))
                .route("/users/{id}", web::get().to(users::get_user))
                .route("/users/{id}", web::patch().to(users::update_user))
                .route("/users/{id}", web::delete().to(users::delete_user)),
        );
}
