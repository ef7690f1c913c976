//! # Grove Infrastructure
//!
//! Concrete implementations of the ports defined in `grove-core`.
//! This crate contains database, email, image host and rate limiting integrations.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory adapters only
//! - `postgres` - PostgreSQL database support via SeaORM
//! - `rate-limit` - Per-client rate limiting via governor
//! - `smtp` - Email delivery via lettre
//! - `cloudinary` - Image hosting on Cloudinary

pub mod auth;
pub mod database;
pub mod media;
pub mod notify;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-exports - In-Memory
pub use auth::{JwtConfig, JwtTokenService};
pub use database::InMemoryStore;
pub use media::InMemoryMediaStore;
pub use notify::{LogMailer, NotifyQueueConfig, QueuedNotifier};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};

// Re-exports - External services
#[cfg(feature = "postgres")]
pub use database::{DatabaseConfig, connect};
#[cfg(feature = "cloudinary")]
pub use media::{CloudinaryConfig, CloudinaryMediaStore};
#[cfg(feature = "smtp")]
pub use notify::{SmtpConfig, SmtpMailer};
