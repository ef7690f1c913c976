//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod media;
mod notification;
mod rate_limit;
mod repository;

pub use auth::{AuthError, TokenClaims, TokenService};
pub use media::{ImageUpload, MAX_IMAGE_BYTES, MediaError, MediaStore, StoredImage};
pub use notification::{Mailer, Notification, NotificationKind, Notifier, NotifyError};
pub use rate_limit::{RateLimitError, RateLimitResult, RateLimiter};
pub use repository::{
    BaseRepository, CommentRepository, HeartRepository, PostRepository, UserRepository,
};
