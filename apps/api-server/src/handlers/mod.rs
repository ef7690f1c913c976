//! HTTP handlers and route configuration.

mod admin;
mod auth;
mod engagement;
mod health;
mod mapping;
mod posts;
mod seo;
mod upload;
mod user;

#[cfg(test)]
pub(crate) mod test_support;

use actix_web::web;

use grove_core::ports::MAX_IMAGE_BYTES;

use crate::middleware::error::AppError;

/// Configure the `/api` routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(api_scope());
}

/// Configure the `/api` routes behind a per-client rate limit.
#[cfg(feature = "rate-limit")]
pub fn configure_limited_routes(
    limiter: std::sync::Arc<dyn grove_core::ports::RateLimiter>,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.service(
            api_scope().wrap(crate::middleware::rate_limit::RateLimitMiddleware::new(limiter)),
        );
    }
}

/// Configure the crawler files served from the site root.
pub fn configure_seo(cfg: &mut web::ServiceConfig) {
    cfg.route("/sitemap.xml", web::get().to(seo::sitemap))
        .route("/robots.txt", web::get().to(seo::robots));
}

fn api_scope() -> actix_web::Scope {
    web::scope("/api")
        .app_data(web::JsonConfig::default().error_handler(|err, _req| {
            AppError::BadRequest(err.to_string()).into()
        }))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| {
            AppError::BadRequest(err.to_string()).into()
        }))
        // A malformed id names no resource.
        .app_data(web::PathConfig::default().error_handler(|err, _req| {
            AppError::NotFound(err.to_string()).into()
        }))
        .route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/auth")
                .route("/sign-in", web::post().to(auth::sign_in))
                .route("/me", web::get().to(auth::me)),
        )
        // Fixed paths before `{slug}`.
        .service(
            web::scope("/posts")
                .route("", web::get().to(posts::list))
                .route("", web::post().to(posts::submit))
                .route("/heart", web::post().to(engagement::toggle_heart))
                .route("/comment", web::post().to(engagement::add_comment))
                .route("/{slug}", web::get().to(posts::get_by_slug)),
        )
        .service(
            web::scope("/upload")
                // One byte over the limit is enough to reject oversized images.
                .app_data(web::PayloadConfig::new(MAX_IMAGE_BYTES + 1))
                .route("/image", web::post().to(upload::upload_image)),
        )
        .service(web::scope("/user").route("/posts", web::get().to(user::dashboard)))
        .service(
            web::scope("/admin/posts")
                .route("", web::get().to(admin::list_posts))
                .route("/approve", web::post().to(admin::approve))
                .route("/reject", web::post().to(admin::reject))
                .route("/{id}", web::delete().to(admin::delete)),
        )
}
