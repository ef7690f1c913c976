//! # Grove API Server
//!
//! HTTP entry point for the moderated community blog.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod config;
mod handlers;
mod middleware;
mod state;
mod telemetry;

use config::AppConfig;
use state::AppState;
use telemetry::{TelemetryConfig, init_telemetry};

#[cfg(feature = "rate-limit")]
const RATE_LIMIT_PRUNE_INTERVAL: std::time::Duration = std::time::Duration::from_secs(300);

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    tracing::info!(
        "Starting Grove API Server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::new(&config).await;

    #[cfg(feature = "rate-limit")]
    let limiter = {
        let limiter = std::sync::Arc::new(grove_infra::InMemoryRateLimiter::new(
            config.rate_limit.clone(),
        ));
        let pruned = limiter.clone();
        actix_rt::spawn(async move {
            let mut interval = actix_rt::time::interval(RATE_LIMIT_PRUNE_INTERVAL);
            loop {
                interval.tick().await;
                pruned.prune();
            }
        });
        limiter
    };

    HttpServer::new(move || {
        let app = App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure_seo);

        #[cfg(feature = "rate-limit")]
        let app = app.configure(handlers::configure_limited_routes(limiter.clone()));
        #[cfg(not(feature = "rate-limit"))]
        let app = app.configure(handlers::configure_routes);

        app
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
