//! Application configuration loaded from environment variables.

use std::env;

use chrono::FixedOffset;

use grove_core::services::PostingPolicy;
use grove_infra::{JwtConfig, NotifyQueueConfig};

#[cfg(feature = "postgres")]
use grove_infra::DatabaseConfig;
#[cfg(feature = "cloudinary")]
use grove_infra::CloudinaryConfig;
#[cfg(feature = "rate-limit")]
use grove_infra::RateLimitConfig;
#[cfg(feature = "smtp")]
use grove_infra::SmtpConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Public origin of the site, used for links in emails and the sitemap.
    pub site_url: String,
    /// Shared secret the identity gateway presents on sign-in. Sign-in is
    /// disabled when unset.
    pub gateway_secret: Option<String>,
    pub posting: PostingPolicy,
    pub jwt: JwtConfig,
    pub notify: NotifyQueueConfig,
    #[cfg(feature = "postgres")]
    pub database: Option<DatabaseConfig>,
    #[cfg(feature = "smtp")]
    pub smtp: Option<SmtpConfig>,
    #[cfg(feature = "cloudinary")]
    pub cloudinary: Option<CloudinaryConfig>,
    #[cfg(feature = "rate-limit")]
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            site_url: env::var("SITE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            gateway_secret: env::var("IDENTITY_GATEWAY_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
            posting: Self::posting_policy(),
            jwt: JwtConfig::from_env(),
            notify: NotifyQueueConfig::from_env(),
            #[cfg(feature = "postgres")]
            database: Self::database(),
            #[cfg(feature = "smtp")]
            smtp: SmtpConfig::from_env(),
            #[cfg(feature = "cloudinary")]
            cloudinary: CloudinaryConfig::from_env(),
            #[cfg(feature = "rate-limit")]
            rate_limit: RateLimitConfig::from_env(),
        }
    }

    fn posting_policy() -> PostingPolicy {
        let defaults = PostingPolicy::default();

        let day_offset = env::var("POST_QUOTA_UTC_OFFSET_MINUTES")
            .ok()
            .and_then(|m| m.parse::<i32>().ok())
            .and_then(|minutes| {
                let offset = minutes
                    .checked_mul(60)
                    .and_then(FixedOffset::east_opt);
                if offset.is_none() {
                    tracing::warn!(minutes, "Ignoring out-of-range POST_QUOTA_UTC_OFFSET_MINUTES");
                }
                offset
            })
            .unwrap_or(defaults.day_offset);

        PostingPolicy {
            daily_limit: env::var("POST_DAILY_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.daily_limit),
            day_offset,
        }
    }

    #[cfg(feature = "postgres")]
    fn database() -> Option<DatabaseConfig> {
        env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100),
            min_connections: env::var("DB_MIN_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        })
    }
}
